use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all strata resolution failures.
///
/// Every variant is a resolution-time, user-visible failure caused by a
/// static misconfiguration. None are retried automatically.
#[derive(Debug, Error, Diagnostic)]
pub enum StrataError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A recipe file could not be parsed or violates a structural invariant.
    #[error("malformed recipe '{recipe}': {message}")]
    #[diagnostic(help("check the recipe file for syntax errors and undeclared variant values"))]
    MalformedRecipe { recipe: String, message: String },

    /// A configuration override names an unknown variant or an illegal value.
    #[error("invalid value '{value}' for variant '{variant}' of package '{package}'")]
    #[diagnostic(help("run `strata list <package>` to see the declared variants and their legal values"))]
    InvalidVariantValue {
        package: String,
        variant: String,
        value: String,
    },

    /// No registered version of a dependency satisfies a range constraint.
    #[error("no version of '{package}' satisfies '{constraint}' (required by '{requirer}')")]
    UnsatisfiableVersion {
        package: String,
        constraint: String,
        requirer: String,
    },

    /// Dependency resolution revisited a package on the active resolution
    /// stack with an incompatible configuration.
    #[error("cyclic dependency: {chain}")]
    CyclicDependency { chain: String },

    /// A conflict rule evaluated true against the final configuration.
    #[error("conflicting configuration for '{package}': rule '{rule}' forbids '{settings}'{message}")]
    ConfigurationConflict {
        package: String,
        rule: String,
        settings: String,
        message: String,
    },

    /// More than one resolved package provides the same abstract capability.
    #[error("ambiguous providers for capability '{capability}': {providers}")]
    #[diagnostic(help("disable the provides-gating variants on all but one candidate"))]
    AmbiguousProvider {
        capability: String,
        providers: String,
    },

    /// A dependency edge names a package absent from the registry.
    #[error("package '{package}' not found in the recipe registry (required by '{requirer}')")]
    PackageNotFound { package: String, requirer: String },

    /// A request spec on the command line could not be parsed.
    #[error("malformed request '{request}': {message}")]
    #[diagnostic(help("request specs look like 'mesa@21.2:+glx~egl swr=avx,avx2'"))]
    MalformedRequest { request: String, message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type StrataResult<T> = miette::Result<T>;
