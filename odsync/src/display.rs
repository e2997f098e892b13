use colored::{Color, Colorize};

use recon_model::Operation;

fn styled<S: ToString, C: Into<Color>>(text: S, color: C) -> String {
    text.to_string().color(color).to_string()
}

/// One rendered line per operation, colored the way `bbup`'s tree display
/// colors additions/removals/modifications: green for adds, red for
/// removals, yellow for everything that mutates an existing node in place.
/// Scripts here are flat, not tree-shaped, so unlike the teacher's
/// `StringTree` this renders straight to a line list.
pub fn render_script(label: &str, script: &[Operation]) -> String {
    if script.is_empty() {
        return format!("{label}: (no changes)");
    }
    let mut lines = vec![format!("{label}:")];
    for op in script {
        lines.push(format!("  {}", render_op(op)));
    }
    lines.join("\n")
}

fn render_op(op: &Operation) -> String {
    match op {
        Operation::AddFile { name, .. } => styled(format!("[+f] {name}"), "green"),
        Operation::AddDir { name, .. } => styled(format!("[+d] {name}/"), "green"),
        Operation::DelFile { id } => styled(format!("[-f] {id}"), "red"),
        Operation::DelDir { id } => styled(format!("[-d] {id}/"), "red"),
        Operation::ModifyFile { id, .. } => styled(format!("[~f] {id}"), "yellow"),
        Operation::RenameMoveFile { .. } | Operation::RenameMoveDir { .. } => {
            styled(format!("[~] {op}"), "yellow")
        }
    }
}
