pub use interval::{Interval, IntervalOp};
pub use segment::Segment;
pub use strand::Strand;

mod interval;
mod segment;
mod strand;
