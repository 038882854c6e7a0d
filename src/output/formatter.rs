use std::path::{Component, Path};

use crate::analyzer::statement::Statement;
use crate::error::{Error, Result};
use crate::output::report;

/// Render statements as a SQL script, one statement per line.
pub fn format_statements(statements: &[Statement]) -> String {
    let mut out = String::new();
    for statement in statements {
        out.push_str(&statement.to_string());
        out.push('\n');
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Write `{name}.sql` and `{name}_report.md` into `output_dir`.
pub fn write_output(output_dir: &Path, name: &str, statements: &[Statement]) -> Result<()> {
    validate_output_name(name)?;

    std::fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

    let script_path = output_dir.join(format!("{name}.sql"));
    let mut script = format_statements(statements);
    if !script.is_empty() {
        script.push('\n');
    }
    std::fs::write(&script_path, script).map_err(|e| Error::io(&script_path, e))?;

    let report_path = output_dir.join(format!("{name}_report.md"));
    std::fs::write(&report_path, report::build_report(statements))
        .map_err(|e| Error::io(&report_path, e))?;

    Ok(())
}

fn validate_output_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidOutputName(
            "output name must not be empty".to_string(),
        ));
    }
    let candidate = Path::new(name);
    if candidate.is_absolute()
        || candidate.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        })
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(Error::InvalidOutputName(format!(
            "'{name}' must be a plain file stem without path segments"
        )));
    }
    Ok(())
}
