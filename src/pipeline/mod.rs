pub mod driver;

pub use driver::PipelineDriver;
