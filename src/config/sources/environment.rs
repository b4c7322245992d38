//! Environment source: `SITESMITH__PIPELINE__ATTEMPT_TIMEOUT_SECS=60` sets
//! `pipeline.attempt_timeout_secs`.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("SITESMITH")
            .separator("__")
            .try_parsing(true),
    )
}
