/// STL import: triangle soups become welded wireframe meshes
use std::collections::{HashMap, HashSet};

use nom::{
    bytes::complete::{tag, take, take_till},
    character::complete::{multispace0, multispace1},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::geometry::Mesh;

type Facet = [[f32; 3]; 3];

/// Collects facets, sharing coincident vertices and edges
#[derive(Default)]
struct Welder {
    mesh: Mesh,
    index: HashMap<[u32; 3], usize>,
    seen: HashSet<(usize, usize)>,
}

impl Welder {
    fn vertex(&mut self, p: [f32; 3]) -> usize {
        // +0.0 and -0.0 must weld together
        let key = p.map(|c| if c == 0.0 { 0 } else { c.to_bits() });
        let mesh = &mut self.mesh;
        *self
            .index
            .entry(key)
            .or_insert_with(|| mesh.add_vertex(p[0] as f64, p[1] as f64, p[2] as f64))
    }

    fn facet(&mut self, facet: &Facet) {
        let ids = facet.map(|p| self.vertex(p));
        for (a, b) in [(ids[0], ids[1]), (ids[1], ids[2]), (ids[2], ids[0])] {
            if a != b && self.seen.insert((a.min(b), a.max(b))) {
                self.mesh.add_edge(vec![a, b]);
            }
        }
    }

    fn finish(self) -> Mesh {
        self.mesh
    }
}

fn weld<'a>(facets: impl IntoIterator<Item = &'a Facet>) -> Mesh {
    let mut welder = Welder::default();
    for facet in facets {
        welder.facet(facet);
    }
    welder.finish()
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x, y, z]))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Facet> {
    // normal, three corners, attribute byte count
    let (input, _) = take(12usize)(input)?;
    let (input, (a, b, c)) = tuple((binary_vector, binary_vector, binary_vector))(input)?;
    let (input, _) = take(2usize)(input)?;
    Ok((input, [a, b, c]))
}

fn binary_stl(input: &[u8]) -> IResult<&[u8], Vec<Facet>> {
    let (input, _) = take(80usize)(input)?;
    let (input, n) = le_u32(input)?;
    count(binary_facet, n as usize)(input)
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh> {
    if data.len() < 84 {
        return Err(Error::Stl("file too small to be a binary STL".to_string()));
    }
    let declared = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    if (data.len() - 84) / 50 < declared {
        return Err(Error::Stl(format!(
            "header declares {} facets but the file holds {}",
            declared,
            (data.len() - 84) / 50
        )));
    }
    let (_, facets) =
        binary_stl(data).map_err(|e| Error::Stl(format!("malformed binary STL: {:?}", e)))?;
    Ok(weld(&facets))
}

fn ascii_vector(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, (x, _, y, _, z)) =
        preceded(multispace0, tuple((float, multispace1, float, multispace1, float)))(input)?;
    Ok((input, [x, y, z]))
}

fn ascii_corner(input: &str) -> IResult<&str, [f32; 3]> {
    preceded(tuple((multispace0, tag("vertex"))), ascii_vector)(input)
}

fn ascii_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = tuple((multispace0, tag("facet"), multispace1, tag("normal")))(input)?;
    let (input, _) = ascii_vector(input)?;
    let (input, _) = tuple((multispace0, tag("outer"), multispace1, tag("loop")))(input)?;
    let (input, (a, b, c)) = tuple((ascii_corner, ascii_corner, ascii_corner))(input)?;
    let (input, _) = tuple((multispace0, tag("endloop"), multispace0, tag("endfacet")))(input)?;
    Ok((input, [a, b, c]))
}

fn ascii_stl(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = tuple((multispace0, tag("solid"), take_till(|c| c == '\n')))(input)?;
    let (input, facets) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, facets))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh> {
    let (_, facets) =
        ascii_stl(input).map_err(|e| Error::Stl(format!("malformed ASCII STL: {:?}", e)))?;
    Ok(weld(&facets))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh> {
    // binary files may also start with "solid", so fall back on failure
    if data.starts_with(b"solid") {
        if let Ok(mesh) = std::str::from_utf8(data)
            .map_err(|e| Error::Stl(e.to_string()))
            .and_then(parse_ascii_stl)
        {
            return Ok(mesh);
        }
    }
    parse_binary_stl(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TETRA: &str = "solid tetra
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0 -1 0
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 0 1
    endloop
  endfacet
  facet normal -1 0 0
    outer loop
      vertex 0 0 0
      vertex 0 1 0
      vertex 0 0 1
    endloop
  endfacet
  facet normal 1 1 1
    outer loop
      vertex 1 0 0
      vertex 0 1 0
      vertex 0 0 -0
    endloop
  endfacet
endsolid tetra
";

    fn binary(facets: &[Facet]) -> Vec<u8> {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&(facets.len() as u32).to_le_bytes());
        for facet in facets {
            data.extend_from_slice(&[0u8; 12]);
            for corner in facet {
                for c in corner {
                    data.extend_from_slice(&c.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let mesh = parse_binary_stl(&binary(&[])).unwrap();
        assert!(mesh.vertices.is_empty());
        assert!(mesh.edges.is_empty());
    }

    #[test]
    fn test_ascii_welds_vertices_and_edges() {
        let mesh = parse_stl(TETRA.as_bytes()).unwrap();
        // four corners, six distinct edges; the last facet repeats
        // vertices and edges of the first one (with a signed zero)
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.segment_count(), 6);
        mesh.validate().unwrap();
    }

    #[test]
    fn test_binary_square() {
        let data = binary(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        ]);
        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        // four sides plus the shared diagonal
        assert_eq!(mesh.segment_count(), 5);
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = binary(&[[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        data.truncate(data.len() - 10);
        assert!(matches!(parse_binary_stl(&data), Err(Error::Stl(_))));
        assert!(parse_stl(b"oops").is_err());
    }
}
