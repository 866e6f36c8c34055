pub mod stats;
pub mod segment;
pub mod fold;
pub mod resample;
pub mod center;
pub mod vacancy;
pub mod search;

pub use segment::{detect_segments, Segment, Segmentation};
pub use fold::{FoldError, FoldedCurve, PhaseFolder};
pub use resample::{resample_curve, InlierRange};
pub use center::{find_center, recenter};
pub use vacancy::dip_vacancy;
pub use search::{Candidate, PeriodSearch, SearchError, SearchParams, SearchReport};
