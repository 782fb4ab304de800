mod accumulator;
mod color;
mod simplify;

pub use accumulator::{TrackAccumulator, TrackPoint, TrackSegment, TrackView};
pub use color::color_for;
pub use simplify::simplify_segment;
