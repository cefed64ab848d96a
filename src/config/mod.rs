pub mod gravity_demo;
pub mod pipeline;

pub use self::pipeline::{
    load_config, ConfigError, GravityDecoderConfig, HeadConfig, MetaArchitecture,
    ParamDecoderConfig, PipelineConfig, PERSFORMER_HEADS,
};
