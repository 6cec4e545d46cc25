//! Built-in algorithms: stream endpoints, framing, and basic statistics.

mod devnull;
mod fn_stage;
mod frame_cutter;
mod mean;
mod pool_writer;
mod vector_input;
mod vector_output;

pub use devnull::DevNull;
pub use fn_stage::FnStage;
pub use frame_cutter::FrameCutter;
pub use mean::Mean;
pub use pool_writer::PoolWriter;
pub use vector_input::VectorInput;
pub use vector_output::VectorOutput;
