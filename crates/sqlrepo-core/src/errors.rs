use sqlrepo_core_types::RequestId;
use thiserror::Error;

/// Result type alias using RepoError
pub type Result<T> = std::result::Result<T, RepoError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers and tests can match on
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoErrorKind {
    // Descriptor / compilation
    MissingIdentifier,
    UnknownField,
    UnsupportedOperator,
    EmptyPredicate,
    TypeMismatch,
    InvalidDescriptor,
    InvalidInput,

    // Repository
    NotRegistered,
    SchemaMismatch,

    // Integration/IO
    Serialization,
    /// Any failure surfaced by the underlying store
    Persistence,
    StoreClosed,
    Io,
    Concurrency,

    // Internal
    Internal,
}

impl RepoErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            RepoErrorKind::MissingIdentifier => "ERR_MISSING_IDENTIFIER",
            RepoErrorKind::UnknownField => "ERR_UNKNOWN_FIELD",
            RepoErrorKind::UnsupportedOperator => "ERR_UNSUPPORTED_OPERATOR",
            RepoErrorKind::EmptyPredicate => "ERR_EMPTY_PREDICATE",
            RepoErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            RepoErrorKind::InvalidDescriptor => "ERR_INVALID_DESCRIPTOR",
            RepoErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            RepoErrorKind::NotRegistered => "ERR_NOT_REGISTERED",
            RepoErrorKind::SchemaMismatch => "ERR_SCHEMA_MISMATCH",
            RepoErrorKind::Serialization => "ERR_SERIALIZATION",
            RepoErrorKind::Persistence => "ERR_PERSISTENCE",
            RepoErrorKind::StoreClosed => "ERR_STORE_CLOSED",
            RepoErrorKind::Io => "ERR_IO",
            RepoErrorKind::Concurrency => "ERR_CONCURRENCY",
            RepoErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) for programmatic handling plus optional
/// context (operation, entity table, field, request id) for debugging.
#[derive(Debug, Clone)]
pub struct RepoError {
    kind: RepoErrorKind,
    op: Option<String>,
    entity: Option<String>,
    field: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<RepoError>>,
}

impl RepoError {
    /// Create a new error with the specified kind
    pub fn new(kind: RepoErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity: None,
            field: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Attribute the error to an enclosing operation
    ///
    /// Sets the op when none is present. An error already tagged with a
    /// different op becomes the source of a copy tagged with `op`, so the
    /// inner op stays reachable through [`source_error`](Self::source_error).
    pub fn within(self, op: impl Into<String>) -> Self {
        let op = op.into();
        match self.op.as_deref() {
            None => self.with_op(op),
            Some(inner) if inner == op => self,
            Some(_) => RepoError {
                kind: self.kind,
                op: Some(op),
                entity: self.entity.clone(),
                field: self.field.clone(),
                request_id: self.request_id.clone(),
                message: self.message.clone(),
                source: Some(Box::new(self)),
            },
        }
    }

    /// Add entity (table) context
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: RepoError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> RepoErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&RepoError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity) = &self.entity {
            write!(f, " (entity: {})", entity)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Errors raised while building descriptors and compiling predicates
///
/// These never touch the store; they describe a caller mistake that is
/// detectable before any I/O happens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Entity type declares no identifier field
    #[error("Entity {entity} declares no identifier field")]
    MissingIdentifier { entity: String },

    /// Predicate or join references a field the entity does not persist
    #[error("Entity {entity} has no field named {field}")]
    UnknownField { entity: String, field: String },

    /// Operator or connective the compiler does not implement
    #[error("Unsupported operator {operator} in {context}")]
    UnsupportedOperator { operator: String, context: String },

    /// Predicate contains no comparison to compile
    #[error("Predicate has no comparisons")]
    EmptyPredicate,

    /// Literal cannot be compared with the field's kind
    #[error("Field {entity}.{field} is {expected}, got {found} literal")]
    TypeMismatch {
        entity: String,
        field: String,
        expected: String,
        found: String,
    },

    /// Descriptor failed structural validation
    #[error("Invalid descriptor for {entity}: {reason}")]
    InvalidDescriptor { entity: String, reason: String },
}

impl From<QueryError> for RepoError {
    fn from(err: QueryError) -> Self {
        let message = err.to_string();
        match err {
            QueryError::MissingIdentifier { entity } => {
                RepoError::new(RepoErrorKind::MissingIdentifier)
                    .with_entity(entity)
                    .with_message(message)
            }
            QueryError::UnknownField { entity, field } => {
                RepoError::new(RepoErrorKind::UnknownField)
                    .with_entity(entity)
                    .with_field(field)
                    .with_message(message)
            }
            QueryError::UnsupportedOperator { .. } => {
                RepoError::new(RepoErrorKind::UnsupportedOperator).with_message(message)
            }
            QueryError::EmptyPredicate => {
                RepoError::new(RepoErrorKind::EmptyPredicate).with_message(message)
            }
            QueryError::TypeMismatch { entity, field, .. } => {
                RepoError::new(RepoErrorKind::TypeMismatch)
                    .with_entity(entity)
                    .with_field(field)
                    .with_message(message)
            }
            QueryError::InvalidDescriptor { entity, .. } => {
                RepoError::new(RepoErrorKind::InvalidDescriptor)
                    .with_entity(entity)
                    .with_message(message)
            }
        }
    }
}

/// Create a serialization error for an entity conversion failure
pub fn serialization_error(entity: &str, reason: impl Into<String>) -> RepoError {
    RepoError::new(RepoErrorKind::Serialization)
        .with_entity(entity)
        .with_message(reason)
}
