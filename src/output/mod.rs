/// Renders a plan as a SQL script and writes the script and report to disk.
pub mod formatter;
/// Builds a Markdown summary of a plan.
pub mod report;
