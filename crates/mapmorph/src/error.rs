/// Structural violations reported by the mapping validator.
///
/// Never raised as a hard fault: the validator collects every failing check
/// and returns the whole set so a caller can display all of them at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    OnlyOneMultiLevelWildcard,
    MultiLevelWildcardOnlyAtEnd,
    NoMultiLevelWildcardAllowedInTemplateTopic,
    OnlyOneSubstitutionDefiningDeviceIdentifierCanBeUsed,
    OneSubstitutionDefiningDeviceIdentifierMustBeUsed,
    DeviceIdentifierMustBeSelected,
    TemplateTopicMustMatchTheSubscriptionTopic,
    TemplateTopicNotUnique,
    TemplateTopicMustNotBeSubstringOfOtherTemplateTopic,
    TemplateTopicAndTemplateTopicSampleDoNotHaveSameNumberOfLevelsInTopicName,
    TemplateTopicAndTemplateTopicSampleDoNotHaveSameStructureInTopicName,
    SourceTemplateMustBeValidJson,
    TargetTemplateMustBeValidJson,
}

impl ValidationError {
    /// Symbolic code as persisted and exchanged with hosts.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationError::OnlyOneMultiLevelWildcard => "Only_One_Multi_Level_Wildcard",
            ValidationError::MultiLevelWildcardOnlyAtEnd => "Multi_Level_Wildcard_Only_At_End",
            ValidationError::NoMultiLevelWildcardAllowedInTemplateTopic => {
                "No_Multi_Level_Wildcard_Allowed_In_TemplateTopic"
            }
            ValidationError::OnlyOneSubstitutionDefiningDeviceIdentifierCanBeUsed => {
                "Only_One_Substitution_Defining_Device_Identifier_Can_Be_Used"
            }
            ValidationError::OneSubstitutionDefiningDeviceIdentifierMustBeUsed => {
                "One_Substitution_Defining_Device_Identifier_Must_Be_Used"
            }
            ValidationError::DeviceIdentifierMustBeSelected => "Device_Identifier_Must_Be_Selected",
            ValidationError::TemplateTopicMustMatchTheSubscriptionTopic => {
                "TemplateTopic_Must_Match_The_SubscriptionTopic"
            }
            ValidationError::TemplateTopicNotUnique => "TemplateTopic_Not_Unique",
            ValidationError::TemplateTopicMustNotBeSubstringOfOtherTemplateTopic => {
                "TemplateTopic_Must_Not_Be_Substring_Of_Other_TemplateTopic"
            }
            ValidationError::TemplateTopicAndTemplateTopicSampleDoNotHaveSameNumberOfLevelsInTopicName => {
                "TemplateTopic_And_TemplateTopicSample_Do_Not_Have_Same_Number_Of_Levels_In_Topic_Name"
            }
            ValidationError::TemplateTopicAndTemplateTopicSampleDoNotHaveSameStructureInTopicName => {
                "TemplateTopic_And_TemplateTopicSample_Do_Not_Have_Same_Structure_In_Topic_Name"
            }
            ValidationError::SourceTemplateMustBeValidJson => "Source_Template_Must_Be_Valid_JSON",
            ValidationError::TargetTemplateMustBeValidJson => "Target_Template_Must_Be_Valid_JSON",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal failures of a single evaluate/execute call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformErrorKind {
    MalformedSourcePayload,
    UnsupportedTargetKind,
    InvalidExpression,
    EvaluationError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    pub kind: TransformErrorKind,
    pub message: String,
    pub path: Option<String>,
}

impl TransformError {
    pub fn new(kind: TransformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{} (path: {})", self.message, path)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for TransformError {}

impl From<serde_json::Error> for TransformError {
    fn from(err: serde_json::Error) -> Self {
        TransformError::new(
            TransformErrorKind::MalformedSourcePayload,
            format!("json error: {}", err),
        )
    }
}

/// Failure to parse a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    pub message: String,
}

impl PathError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for TransformError {
    fn from(err: PathError) -> Self {
        TransformError::new(TransformErrorKind::InvalidExpression, err.message)
    }
}

/// Rejected snoop lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnoopError {
    InvalidTransition {
        from: crate::model::SnoopStatus,
        action: &'static str,
    },
    NoSnoopedTemplates,
    SampleIndexOutOfRange {
        index: usize,
        len: usize,
    },
}

impl std::fmt::Display for SnoopError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnoopError::InvalidTransition { from, action } => {
                write!(f, "cannot {} while snoop status is {:?}", action, from)
            }
            SnoopError::NoSnoopedTemplates => write!(f, "no snooped templates were captured"),
            SnoopError::SampleIndexOutOfRange { index, len } => {
                write!(f, "snooped template index {} out of range ({})", index, len)
            }
        }
    }
}

impl std::error::Error for SnoopError {}
