use super::traits::{ConfigurationFile, Frame};
use crate::core::models::cell::{Cell, GeometryError};
use crate::core::models::configuration::AtomicConfiguration;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtXyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: ExtXyzParseErrorKind,
    },
    #[error("Invalid lattice on line {line}: {source}")]
    Lattice {
        line: usize,
        #[source]
        source: GeometryError,
    },
    #[error("Frame {0} has no energy and forces")]
    Unlabeled(usize),
}

#[derive(Debug, Error, PartialEq)]
pub enum ExtXyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("File ended after {found} of {expected} atom lines")]
    Truncated { expected: usize, found: usize },
    #[error("Missing comment line")]
    MissingComment,
    #[error("Unterminated quoted value in comment line")]
    UnterminatedQuote,
    #[error("Malformed Properties value '{0}'")]
    MalformedProperties(String),
    #[error("Properties is missing the required '{0}' column")]
    MissingProperty(&'static str),
    #[error("Lattice must contain 9 numbers, got '{0}'")]
    MalformedLattice(String),
    #[error("Invalid energy value '{0}'")]
    InvalidEnergy(String),
    #[error("Expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("Invalid float '{value}' in column {column}")]
    InvalidFloat { column: usize, value: String },
}

/// Column layout of the atom lines, derived from the `Properties` key.
#[derive(Debug, Clone, PartialEq)]
struct ColumnLayout {
    width: usize,
    species: usize,
    positions: usize,
    forces: Option<usize>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            width: 4,
            species: 0,
            positions: 1,
            forces: None,
        }
    }
}

impl ColumnLayout {
    fn parse(value: &str) -> Result<Self, ExtXyzParseErrorKind> {
        let fields: Vec<&str> = value.split(':').collect();
        if fields.len() % 3 != 0 {
            return Err(ExtXyzParseErrorKind::MalformedProperties(value.to_string()));
        }

        let mut column = 0;
        let mut species = None;
        let mut positions = None;
        let mut forces = None;
        for triple in fields.chunks(3) {
            let name = triple[0].to_ascii_lowercase();
            let count: usize = triple[2]
                .parse()
                .map_err(|_| ExtXyzParseErrorKind::MalformedProperties(value.to_string()))?;
            match name.as_str() {
                "species" if count == 1 => species = Some(column),
                "pos" if count == 3 => positions = Some(column),
                "forces" | "force" if count == 3 => forces = Some(column),
                _ => {}
            }
            column += count;
        }

        Ok(Self {
            width: column,
            species: species.ok_or(ExtXyzParseErrorKind::MissingProperty("species"))?,
            positions: positions.ok_or(ExtXyzParseErrorKind::MissingProperty("pos"))?,
            forces,
        })
    }
}

/// Splits a comment line into `key=value` pairs, honoring double quotes.
///
/// Keys are lower-cased. A bare word without `=` is stored with an empty value.
fn parse_comment(line: &str) -> Result<HashMap<String, String>, ExtXyzParseErrorKind> {
    let mut pairs = HashMap::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'=') {
            chars.next();
            if chars.peek() == Some(&'"') {
                chars.next();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(ExtXyzParseErrorKind::UnterminatedQuote);
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
        }
        pairs.insert(key.to_ascii_lowercase(), value);
    }
    Ok(pairs)
}

fn parse_lattice(value: &str) -> Result<[f64; 9], ExtXyzParseErrorKind> {
    let numbers: Vec<f64> = value
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| ExtXyzParseErrorKind::MalformedLattice(value.to_string()))?;
    numbers
        .try_into()
        .map_err(|_| ExtXyzParseErrorKind::MalformedLattice(value.to_string()))
}

fn is_fully_non_periodic(pbc: &str) -> bool {
    let flags: Vec<&str> = pbc.split_whitespace().collect();
    !flags.is_empty()
        && flags
            .iter()
            .all(|f| matches!(*f, "F" | "f" | "False" | "false" | "0"))
}

fn parse_vector(columns: &[&str], start: usize) -> Result<Vector3<f64>, ExtXyzParseErrorKind> {
    let mut v = Vector3::zeros();
    for k in 0..3 {
        let raw = columns[start + k];
        v[k] = raw.parse().map_err(|_| ExtXyzParseErrorKind::InvalidFloat {
            column: start + k + 1,
            value: raw.to_string(),
        })?;
    }
    Ok(v)
}

pub struct ExtXyzFile;

const MAX_PREALLOCATED_ATOMS: usize = 4096;

impl ExtXyzFile {
    fn read_frame(
        lines: &mut impl Iterator<Item = (usize, io::Result<String>)>,
        count_line: (usize, String),
    ) -> Result<Frame, ExtXyzError> {
        let (count_line_num, count_text) = count_line;
        let atom_count: usize =
            count_text
                .trim()
                .parse()
                .map_err(|_| ExtXyzError::Parse {
                    line: count_line_num,
                    kind: ExtXyzParseErrorKind::InvalidAtomCount(count_text.trim().to_string()),
                })?;

        let (comment_line_num, comment) = match lines.next() {
            Some((n, line)) => (n, line?),
            None => {
                return Err(ExtXyzError::Parse {
                    line: count_line_num + 1,
                    kind: ExtXyzParseErrorKind::MissingComment,
                });
            }
        };
        let parse_err = |kind| ExtXyzError::Parse {
            line: comment_line_num,
            kind,
        };

        let pairs = parse_comment(&comment).map_err(parse_err)?;
        let layout = match pairs.get("properties") {
            Some(value) => ColumnLayout::parse(value).map_err(parse_err)?,
            None => ColumnLayout::default(),
        };

        let periodic = !pairs.get("pbc").is_some_and(|p| is_fully_non_periodic(p));
        let cell = match pairs.get("lattice") {
            Some(value) if periodic => {
                let flat = parse_lattice(value).map_err(parse_err)?;
                Some(Cell::from_flat(&flat).map_err(|source| ExtXyzError::Lattice {
                    line: comment_line_num,
                    source,
                })?)
            }
            _ => None,
        };

        let energy = match pairs.get("energy") {
            Some(value) => Some(
                value
                    .parse::<f64>()
                    .map_err(|_| parse_err(ExtXyzParseErrorKind::InvalidEnergy(value.clone())))?,
            ),
            None => None,
        };

        // The header count is untrusted until the atom lines are actually read.
        let capacity = atom_count.min(MAX_PREALLOCATED_ATOMS);
        let mut positions = Vec::with_capacity(capacity);
        let mut elements = Vec::with_capacity(capacity);
        let mut forces = layout.forces.map(|_| Vec::with_capacity(capacity));

        for found in 0..atom_count {
            let (line_num, line) = match lines.next() {
                Some((n, line)) => (n, line?),
                None => {
                    return Err(ExtXyzError::Parse {
                        line: comment_line_num + found + 1,
                        kind: ExtXyzParseErrorKind::Truncated {
                            expected: atom_count,
                            found,
                        },
                    });
                }
            };
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < layout.width {
                return Err(ExtXyzError::Parse {
                    line: line_num,
                    kind: ExtXyzParseErrorKind::ColumnCount {
                        expected: layout.width,
                        found: columns.len(),
                    },
                });
            }
            let atom_err = |kind| ExtXyzError::Parse {
                line: line_num,
                kind,
            };

            elements.push(columns[layout.species].to_string());
            positions.push(Point3::from(
                parse_vector(&columns, layout.positions).map_err(atom_err)?,
            ));
            if let (Some(col), Some(forces)) = (layout.forces, forces.as_mut()) {
                forces.push(parse_vector(&columns, col).map_err(atom_err)?);
            }
        }

        Ok(Frame {
            configuration: AtomicConfiguration::new(positions, elements, cell),
            energy,
            forces,
        })
    }

    fn write_frame(frame: &Frame, writer: &mut impl Write) -> io::Result<()> {
        let config = &frame.configuration;
        writeln!(writer, "{}", config.atom_count())?;

        let mut properties = String::from("species:S:1:pos:R:3");
        if frame.forces.is_some() {
            properties.push_str(":forces:R:3");
        }

        let mut comment = String::new();
        if let Some(cell) = &config.cell {
            let lattice: Vec<String> = cell.to_flat().iter().map(|v| format!("{v:.8}")).collect();
            comment.push_str(&format!("Lattice=\"{}\" ", lattice.join(" ")));
        }
        comment.push_str(&format!("Properties={properties}"));
        if let Some(energy) = frame.energy {
            comment.push_str(&format!(" energy={energy}"));
        }
        let pbc = if config.is_periodic() { "T T T" } else { "F F F" };
        comment.push_str(&format!(" pbc=\"{pbc}\""));
        writeln!(writer, "{comment}")?;

        for (i, (element, pos)) in config.elements.iter().zip(&config.positions).enumerate() {
            write!(
                writer,
                "{:<3} {:>16.8} {:>16.8} {:>16.8}",
                element, pos.x, pos.y, pos.z
            )?;
            if let Some(force) = frame.forces.as_ref().and_then(|f| f.get(i)) {
                write!(
                    writer,
                    " {:>16.8} {:>16.8} {:>16.8}",
                    force.x, force.y, force.z
                )?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

impl ConfigurationFile for ExtXyzFile {
    type Error = ExtXyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Frame>, Self::Error> {
        let mut frames = Vec::new();
        let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));

        while let Some((line_num, line)) = lines.next() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            frames.push(Self::read_frame(&mut lines, (line_num, line))?);
        }
        Ok(frames)
    }

    fn write_to(frames: &[Frame], writer: &mut impl Write) -> Result<(), Self::Error> {
        for frame in frames {
            Self::write_frame(frame, writer)?;
        }
        Ok(())
    }

    fn unlabeled_frame_error(frame_index: usize) -> Self::Error {
        ExtXyzError::Unlabeled(frame_index)
    }
}
