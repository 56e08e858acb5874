// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Crate: crawl                                                        ┃
// ┃ Purpose: Incremental crawl pipeline with recency scheduling         ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-05                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

pub mod bucket;
pub mod pipeline;
pub mod sample;
pub mod sched;
pub mod state;
pub mod status;
pub mod walk;

pub use bucket::Recency;
pub use pipeline::{CrawlMode, CrawlPipeline};
pub use state::{CrawlState, StateFile};
pub use status::{Phase, StatusBoard, StatusSnapshot};
pub use walk::{order_roots, FileEntry};

//EOF
