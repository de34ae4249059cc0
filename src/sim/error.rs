use ::serde_json;
use geom::{Line, ShapeError, Triangle};
use std::error;
use std::fmt;
use std::io;
use std::result;

pub type Result<T> = result::Result<T, Error>;

/// Everything that can go wrong while assembling or loading a model.
/// All variants are fatal to the build they occur in; other input
/// files are unaffected.
#[derive(Debug)]
pub enum Error {
    /// Degenerate line or triangle in the input geometry.
    Shape(ShapeError),
    /// The incoming cell intersects an existing cell.
    CellIntersects(Triangle, Triangle),
    /// One cell is contained within the other (bigger, smaller).
    CellContained(Triangle, Triangle),
    DuplicateCell(Triangle),
    /// An incoming sub-surface overlaps an existing one on the same
    /// edge (existing, incoming).
    SurfaceConflict(Line, Line),
    /// The emit surface matches no cell edge in the model.
    EmitSurfacePlacement(Line),
    /// Invalid combination of settings.
    Config(String),
    UnknownSensor(usize),
    DuplicateSensor(usize),
    UnknownMaterial(String),
    DuplicateMaterial(String),
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Shape(ref err) => write!(f, "{}", err),
            Error::CellIntersects(ref existing, ref incoming) => {
                write!(f, "incoming {} intersects existing {}", incoming, existing)
            }
            Error::CellContained(ref bigger, ref smaller) => {
                write!(f, "{} is contained within {}", smaller, bigger)
            }
            Error::DuplicateCell(ref triangle) => write!(f, "duplicate cell detected: {}", triangle),
            Error::SurfaceConflict(ref existing, ref incoming) => write!(
                f,
                "an existing surface conflicts with the location of the incoming surface: existing {}, incoming {}",
                existing, incoming
            ),
            Error::EmitSurfacePlacement(ref line) => {
                write!(f, "unable to place an emitting surface at {}", line)
            }
            Error::Config(ref msg) => write!(f, "{}", msg),
            Error::UnknownSensor(id) => write!(f, "sensor {} does not exist", id),
            Error::DuplicateSensor(id) => write!(f, "sensor with ID {} already exists", id),
            Error::UnknownMaterial(ref name) => write!(f, "material {} does not exist", name),
            Error::DuplicateMaterial(ref name) => write!(f, "a duplicate material name was detected: {}", name),
            Error::Io(ref err) => write!(f, "{}", err),
            Error::Json(ref err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for Error {}

impl From<ShapeError> for Error {
    fn from(err: ShapeError) -> Error {
        Error::Shape(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}
