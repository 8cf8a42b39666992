pub mod assemble;
pub mod bed;
pub mod coverage;
pub mod decompose;
pub mod mosdepth;
pub mod normalize;
pub mod pipeline;
pub mod write_results;
