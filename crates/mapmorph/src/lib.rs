mod error;
mod model;
mod path;
mod snoop;
mod substitution;
mod template;
mod topic;
mod transform;
mod validator;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{PathError, SnoopError, TransformError, TransformErrorKind, ValidationError};
pub use model::{
    Direction, Mapping, MappingSubstitution, MappingType, Qos, RepairStrategy, SnoopStatus,
    TargetApi, SAMPLE_DEVICE_IDENT, TIME, TOKEN_DEVICE_IDENT, TOKEN_TOPIC_LEVEL,
};
pub use path::{classify, evaluate, parse_path, remove_path, set_path, PathToken, ResultKind};
pub use snoop::{adopt_snooped_template, record_snooped_payload, start_snoop, stop_snoop};
pub use substitution::{check_device_identifier, AddOutcome, SubstitutionConflict};
pub use template::{expand_c8y_template, expand_external_template, reduce_template};
pub use topic::{
    derive_template_topic_from_topic, is_wildcard_topic, normalize_topic, same_topic_structure,
    split_topic_excluding_separator, split_topic_including_separator, TOPIC_WILDCARD_MULTI,
    TOPIC_WILDCARD_SINGLE,
};
pub use transform::{execute, ExecutionConfig, TransformResult};
pub use validator::{
    validate_json_templates, validate_mapping, validate_subscription_topic, validate_substitutions,
    validate_template_topic, validate_template_topic_unique, validate_topic_coverage,
    validate_topic_sample_alignment,
};
