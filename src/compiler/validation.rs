//! WGSL validation using the naga library.

use anyhow::{Context, Result, anyhow};

/// Parse and validate WGSL source code with naga.
///
/// # Arguments
/// * `source` - The WGSL source code to validate
///
/// # Returns
/// The parsed naga Module on success, or an error carrying the numbered source on failure.
pub fn validate_wgsl(source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("WGSL parse failed:\n{}", format_naga_error(source, &e.emit_to_string(source))))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| anyhow!("WGSL validation failed:\n{}", format_naga_error(source, &format!("{e:?}"))))?;

    Ok(module)
}

/// Validate WGSL and name what generated it in the error.
///
/// # Arguments
/// * `source` - The WGSL source code to validate
/// * `context` - Description of what generated this WGSL (e.g., "graph scene.json")
pub fn validate_wgsl_with_context(source: &str, context: &str) -> Result<naga::Module> {
    validate_wgsl(source).with_context(|| format!("{context} generated invalid WGSL"))
}

/// Error message followed by the source with line numbers.
fn format_naga_error(source: &str, message: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("  {}\n", message.trim_end()));

    output.push_str("\nGenerated WGSL:\n");
    output.push_str("---\n");
    for (line_num, line) in source.lines().enumerate() {
        output.push_str(&format!("{:4} | {}\n", line_num + 1, line));
    }
    output.push_str("---\n");

    output
}
