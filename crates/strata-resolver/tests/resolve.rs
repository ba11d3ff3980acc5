//! End-to-end resolution scenarios over small in-memory recipe corpora.

use strata_core::recipe::load_str;
use strata_core::registry::Registry;
use strata_core::spec::Spec;
use strata_resolver::context::EvalContext;
use strata_resolver::resolver::resolve;
use strata_util::errors::StrataError;

const SHA_A: &str = "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb";
const SHA_B: &str = "3e23e8160039594a33894f6564e1b1348bbd7a0088d42c4acb73eeaed59c009d";
const SHA_C: &str = "2e7d2c03a9507ae265ecf5b5356885a53393a2029d241394997265a1a25aefc6";

fn registry(recipes: &[&str]) -> Registry {
    let mut reg = Registry::new();
    for content in recipes {
        let pkg = load_str(content, "inline.toml").expect("recipe parses");
        reg.insert(pkg).expect("recipe inserts");
    }
    reg
}

fn resolve_str(reg: &Registry, request: &str) -> Result<strata_resolver::resolver::Resolution, StrataError> {
    let spec = Spec::parse(request).expect("request parses");
    resolve(reg, &spec, &EvalContext::default())
}

fn leaf(name: &str, version: &str) -> String {
    format!(
        r#"
[package]
name = "{name}"

[[version]]
version = "{version}"
sha256 = "{SHA_A}"
"#
    )
}

#[test]
fn conditional_edge_follows_resolved_version() {
    // The compatibility shim is needed only for old interpreter lines,
    // mirroring `depends_on("py-enum34", when="^python@:3.3")`.
    let app = format!(
        r#"
[package]
name = "app"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "interp"

[[dependency]]
spec = "shim"
when = "^interp@:3.3"
"#
    );

    let old = registry(&[&app, &leaf("interp", "3.3.7"), &leaf("shim", "1.1.10")]);
    let resolution = resolve_str(&old, "app").unwrap();
    assert!(resolution.graph.find("shim").is_some());

    let new = registry(&[&app, &leaf("interp", "3.9.1"), &leaf("shim", "1.1.10")]);
    let resolution = resolve_str(&new, "app").unwrap();
    assert!(resolution.graph.find("shim").is_none());
}

#[test]
fn edge_settings_propagate_to_dependency() {
    let app = format!(
        r#"
[package]
name = "app"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "lib+shared"
"#
    );
    let lib = format!(
        r#"
[package]
name = "lib"

[[version]]
version = "2.4"
sha256 = "{SHA_B}"

[variants.shared]
kind = "bool"
default = false
"#
    );

    let reg = registry(&[&app, &lib]);
    let resolution = resolve_str(&reg, "app").unwrap();
    let idx = resolution.graph.find("lib").unwrap();
    assert_eq!(resolution.graph.node(idx).config.is_on("shared"), Some(true));
}

#[test]
fn negation_conjunction_conflict_fires_only_when_all_off() {
    let fe = format!(
        r#"
[package]
name = "frontends"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[variants.egl]
kind = "bool"
default = false

[variants.glx]
kind = "bool"
default = true

[variants.osmesa]
kind = "bool"
default = true

[[conflict]]
when = "~egl ~glx ~osmesa"
message = "at least one front-end is required"
"#
    );
    let reg = registry(&[&fe]);

    // Defaults leave two front-ends on.
    resolve_str(&reg, "frontends").unwrap();
    // Turning off all but one is still fine.
    resolve_str(&reg, "frontends~glx~osmesa+egl").unwrap();

    let err = resolve_str(&reg, "frontends~egl~glx~osmesa").unwrap_err();
    match err {
        StrataError::ConfigurationConflict { package, message, .. } => {
            assert_eq!(package, "frontends");
            assert!(message.contains("front-end"));
        }
        other => panic!("expected ConfigurationConflict, got {other:?}"),
    }
}

#[test]
fn compiler_scoped_conflict() {
    let pkg = format!(
        r#"
[package]
name = "mesa-like"

[[version]]
version = "21.2.1"
sha256 = "{SHA_A}"

[[conflict]]
when = "%gcc@10.1.0"
message = "gcc 10.1.0 miscompiles the compiler backend"
"#
    );
    let reg = registry(&[&pkg]);

    let bad = EvalContext::default().with_compiler("gcc", "10.1.0");
    let spec = Spec::parse("mesa-like").unwrap();
    assert!(matches!(
        resolve(&reg, &spec, &bad),
        Err(StrataError::ConfigurationConflict { .. })
    ));

    let good = EvalContext::default().with_compiler("gcc", "10.2.0");
    resolve(&reg, &spec, &good).unwrap();
}

#[test]
fn unsatisfiable_range_is_an_error_not_a_fallback() {
    let app = format!(
        r#"
[package]
name = "app"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "lib@5:"
"#
    );
    let reg = registry(&[&app, &leaf("lib", "4.9")]);
    let err = resolve_str(&reg, "app").unwrap_err();
    match err {
        StrataError::UnsatisfiableVersion { package, constraint, requirer } => {
            assert_eq!(package, "lib");
            assert_eq!(constraint, "5:");
            assert_eq!(requirer, "app");
        }
        other => panic!("expected UnsatisfiableVersion, got {other:?}"),
    }
}

#[test]
fn missing_package_names_the_requirer() {
    let app = format!(
        r#"
[package]
name = "app"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "nowhere"
"#
    );
    let reg = registry(&[&app]);
    assert!(matches!(
        resolve_str(&reg, "app"),
        Err(StrataError::PackageNotFound { ref package, ref requirer })
            if package == "nowhere" && requirer == "app"
    ));
}

#[test]
fn capability_routes_to_its_single_provider() {
    let app = format!(
        r#"
[package]
name = "app"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "gl@4.5"
"#
    );
    let mesa = format!(
        r#"
[package]
name = "mesa"

[[version]]
version = "21.2.1"
sha256 = "{SHA_B}"

[variants.opengl]
kind = "bool"
default = true

[[provides]]
capability = "gl@4.5"
when = "+opengl"
"#
    );
    let reg = registry(&[&app, &mesa]);
    let resolution = resolve_str(&reg, "app").unwrap();
    assert!(resolution.graph.find("mesa").is_some());
    assert!(resolution.graph.find("gl").is_none());
}

#[test]
fn two_qualified_providers_are_ambiguous() {
    let app = format!(
        r#"
[package]
name = "app"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "gl"
"#
    );
    let mesa = format!(
        r#"
[package]
name = "mesa"

[[version]]
version = "21.2.1"
sha256 = "{SHA_B}"

[[provides]]
capability = "gl@4.5"
"#
    );
    let other = format!(
        r#"
[package]
name = "libglvnd-fe"

[[version]]
version = "1.3"
sha256 = "{SHA_C}"

[[provides]]
capability = "gl@4.6"
"#
    );
    let reg = registry(&[&app, &mesa, &other]);
    let err = resolve_str(&reg, "app").unwrap_err();
    match err {
        StrataError::AmbiguousProvider { capability, providers } => {
            assert_eq!(capability, "gl");
            assert!(providers.contains("mesa"));
            assert!(providers.contains("libglvnd-fe"));
        }
        other => panic!("expected AmbiguousProvider, got {other:?}"),
    }
}

#[test]
fn provider_disabled_by_settings_does_not_qualify() {
    let app = format!(
        r#"
[package]
name = "app"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "gl"
"#
    );
    let mesa = format!(
        r#"
[package]
name = "mesa"

[[version]]
version = "21.2.1"
sha256 = "{SHA_B}"

[variants.opengl]
kind = "bool"
default = false

[[provides]]
capability = "gl@4.5"
when = "+opengl"
"#
    );
    let reg = registry(&[&app, &mesa]);
    // The only candidate's provides predicate is off under its defaults.
    assert!(matches!(
        resolve_str(&reg, "app"),
        Err(StrataError::UnsatisfiableVersion { .. })
    ));
}

#[test]
fn ranged_capability_never_matches_a_versioned_request() {
    let versioned = format!(
        r#"
[package]
name = "app"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "gl@4.5"
"#
    );
    let unversioned = format!(
        r#"
[package]
name = "viewer"

[[version]]
version = "2.0"
sha256 = "{SHA_C}"

[[dependency]]
spec = "gl"
"#
    );
    let mesa = format!(
        r#"
[package]
name = "mesa"

[[version]]
version = "21.2.1"
sha256 = "{SHA_B}"

[[provides]]
capability = "gl@4:"
"#
    );

    // A ranged declaration is not a version point, so the versioned
    // request finds no qualified provider.
    let reg = registry(&[&versioned, &mesa]);
    assert!(matches!(
        resolve_str(&reg, "app"),
        Err(StrataError::UnsatisfiableVersion { .. })
    ));

    // The bare capability still routes through it.
    let reg = registry(&[&unversioned, &mesa]);
    let resolution = resolve_str(&reg, "viewer").unwrap();
    assert!(resolution.graph.find("mesa").is_some());
}

#[test]
fn compatible_back_edge_reuses_the_node() {
    let a = format!(
        r#"
[package]
name = "alpha"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "beta"
"#
    );
    let b = format!(
        r#"
[package]
name = "beta"

[[version]]
version = "2.0"
sha256 = "{SHA_B}"

[[dependency]]
spec = "alpha@1:"
kind = "run"
"#
    );
    let reg = registry(&[&a, &b]);
    let resolution = resolve_str(&reg, "alpha").unwrap();
    // Two nodes, with a run edge closing the loop.
    assert_eq!(resolution.graph.len(), 2);
}

#[test]
fn incompatible_back_edge_reports_the_cycle() {
    let a = format!(
        r#"
[package]
name = "alpha"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "beta"
"#
    );
    let b = format!(
        r#"
[package]
name = "beta"

[[version]]
version = "2.0"
sha256 = "{SHA_B}"

[[dependency]]
spec = "alpha@2:"
"#
    );
    let reg = registry(&[&a, &b]);
    let err = resolve_str(&reg, "alpha").unwrap_err();
    match err {
        StrataError::CyclicDependency { chain } => {
            assert!(chain.contains("alpha"));
            assert!(chain.contains("beta"));
        }
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
}

fn diamond_corpus(right_zlib_spec: &str) -> Registry {
    let app = format!(
        r#"
[package]
name = "app"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "left"

[[dependency]]
spec = "right"
"#
    );
    let left = format!(
        r#"
[package]
name = "left"

[[version]]
version = "1.0"
sha256 = "{SHA_B}"

[[dependency]]
spec = "zlib+shared"
"#
    );
    let right = format!(
        r#"
[package]
name = "right"

[[version]]
version = "1.0"
sha256 = "{SHA_C}"

[[dependency]]
spec = "{right_zlib_spec}"
"#
    );
    let zlib = format!(
        r#"
[package]
name = "zlib"

[[version]]
version = "1.2.11"
sha256 = "{SHA_A}"

[variants.shared]
kind = "bool"
default = true
"#
    );
    registry(&[&app, &left, &right, &zlib])
}

#[test]
fn diamond_with_matching_settings_shares_the_node() {
    let reg = diamond_corpus("zlib+shared");
    let resolution = resolve_str(&reg, "app").unwrap();
    assert_eq!(resolution.graph.len(), 4);
    let zlib = resolution.graph.find("zlib").unwrap();
    assert_eq!(resolution.graph.node(zlib).config.is_on("shared"), Some(true));
}

#[test]
fn diamond_with_conflicting_settings_is_an_error() {
    let reg = diamond_corpus("zlib~shared");
    let err = resolve_str(&reg, "app").unwrap_err();
    match err {
        StrataError::ConfigurationConflict { package, .. } => assert_eq!(package, "zlib"),
        other => panic!("expected ConfigurationConflict, got {other:?}"),
    }
}

#[test]
fn patches_collected_only_inside_their_window() {
    let pkg = format!(
        r#"
[package]
name = "mesa-like"

[[version]]
version = "21.2.1"
sha256 = "{SHA_A}"

[[version]]
version = "21.0.3"
sha256 = "{SHA_B}"

[[patch]]
url = "https://example.invalid/fix-rtti.patch"
sha256 = "{SHA_C}"
when = "@21.0.0:21.0.3"
"#
    );
    let reg = registry(&[&pkg]);

    let inside = resolve_str(&reg, "mesa-like@21.0.3").unwrap();
    assert_eq!(inside.patches.get("mesa-like").map(Vec::len), Some(1));

    let outside = resolve_str(&reg, "mesa-like@21.2.1").unwrap();
    assert!(outside.patches.get("mesa-like").is_none());
}

#[test]
fn env_rules_merge_into_resolution() {
    let pkg = format!(
        r#"
[package]
name = "mesa-like"

[[version]]
version = "21.2.1"
sha256 = "{SHA_A}"

[variants.glx]
kind = "bool"
default = true

[variants.glvnd]
kind = "bool"
default = true

[[env]]
name = "__GLX_VENDOR_LIBRARY_NAME"
value = "mesa"
when = "+glx +glvnd"
"#
    );
    let reg = registry(&[&pkg]);

    let on = resolve_str(&reg, "mesa-like").unwrap();
    assert_eq!(
        on.environment.get("__GLX_VENDOR_LIBRARY_NAME").map(String::as_str),
        Some("mesa")
    );

    let off = resolve_str(&reg, "mesa-like~glvnd").unwrap();
    assert!(off.environment.is_empty());
}

#[test]
fn highest_admissible_version_wins() {
    let pkg = format!(
        r#"
[package]
name = "lib"

[[version]]
version = "master"
branch = "master"

[[version]]
version = "2.4.1"
sha256 = "{SHA_A}"

[[version]]
version = "2.3.0"
sha256 = "{SHA_B}"
"#
    );
    let reg = registry(&[&pkg]);

    // Numbered releases are preferred over floating refs.
    let default = resolve_str(&reg, "lib").unwrap();
    assert_eq!(default.root().unwrap().version.to_string(), "2.4.1");

    let pinned = resolve_str(&reg, "lib@:2.3").unwrap();
    assert_eq!(pinned.root().unwrap().version.to_string(), "2.3.0");

    let floating = resolve_str(&reg, "lib@master").unwrap();
    assert_eq!(floating.root().unwrap().version.to_string(), "master");
}

#[test]
fn resolution_is_deterministic() {
    let app = format!(
        r#"
[package]
name = "app"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "libone"

[[dependency]]
spec = "libtwo"
"#
    );
    let reg = registry(&[&app, &leaf("libone", "1.1"), &leaf("libtwo", "2.2")]);

    let first = resolve_str(&reg, "app").unwrap().graph.print_tree(None);
    for _ in 0..5 {
        assert_eq!(resolve_str(&reg, "app").unwrap().graph.print_tree(None), first);
    }
}
