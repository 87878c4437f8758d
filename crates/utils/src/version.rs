use std::sync::LazyLock;

/// Defines the application version.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    format_version(
        env!("IMAGE_VERSION"),
        option_env!("VERGEN_GIT_SHA"),
        option_env!("VERGEN_GIT_DIRTY"),
    )
});

fn format_version(image_version: &str, sha: Option<&str>, dirty: Option<&str>) -> String {
    let sha = sha.map(|sha| &sha[..sha.len().min(7)]).unwrap_or("unknown");
    let dirty = matches!(dirty, Some("true"));
    format!(
        "{image_version}-{sha}{}",
        if dirty { "-dirty" } else { "" }
    )
}
