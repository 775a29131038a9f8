use std::{
    env,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};

use oxibundle_core::Bundle;

use crate::build::BuildOutput;

/// Display form of an absolute path, relative to the current directory so
/// terminals can turn it into a link.
fn relativize_to_cwd(path: &Path) -> String {
    let Ok(cwd) = env::current_dir() else {
        debug!("Failed to get current directory");
        return path.display().to_string();
    };
    match make_relative(path, &cwd) {
        Some(rel) => rel.to_string_lossy().to_string(),
        None => {
            trace!("Could not relativize {:?} to {:?}", path, cwd);
            path.display().to_string()
        }
    }
}

/// Relative path from `base` to `target`, or None when they share no root.
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();

    let shared = target.iter().zip(&base).take_while(|(t, b)| t == b).count();
    if shared == 0 && target.first() != base.first() {
        return None;
    }

    let mut result = PathBuf::new();
    for _ in &base[shared..] {
        result.push("..");
    }
    for component in &target[shared..] {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

fn write_section<'a, W: Write>(
    writer: &mut W,
    title: &str,
    paths: impl ExactSizeIterator<Item = &'a PathBuf>,
) -> io::Result<()> {
    let count = paths.len();
    writeln!(writer, "{} ({})", title.bold(), count.to_string().cyan())?;
    for (idx, path) in paths.enumerate() {
        let prefix = if idx + 1 == count { "└──" } else { "├──" };
        writeln!(writer, "{}  {}", prefix.dimmed(), relativize_to_cwd(path).blue())?;
    }
    writeln!(writer)
}

pub fn print_partition<W: Write>(writer: &mut W, bundle: &Bundle) -> io::Result<()> {
    debug!(
        "Printing partition: {} entries, {} common, {} uncommon",
        bundle.files().len(),
        bundle.common().len(),
        bundle.uncommon().len()
    );

    write_section(writer, "Entries", bundle.files().iter())?;
    if bundle.options().common.is_enabled() {
        write_section(writer, "Common", bundle.common().iter())?;
    } else {
        writeln!(
            writer,
            "{} Common extraction disabled ({} shared files)\n",
            "●".bright_blue(),
            bundle.shared().len().to_string().cyan()
        )?;
    }
    write_section(writer, "Uncommon", bundle.uncommon().iter())?;

    match bundle.common_destination() {
        Some(dest) => {
            writeln!(writer, "{} Common destination: {}", "→".green(), relativize_to_cwd(dest))?
        }
        None if bundle.options().common.is_enabled() => writeln!(
            writer,
            "{} No common destination, shared files stay in every bundle",
            "⚠".yellow().bold()
        )?,
        None => {}
    }

    writer.flush()
}

pub fn print_destinations<W: Write>(
    writer: &mut W,
    file: &Path,
    destinations: &[PathBuf],
) -> io::Result<()> {
    if destinations.is_empty() {
        writeln!(
            writer,
            "{} {} is not part of any bundle",
            "⚠".yellow().bold(),
            relativize_to_cwd(file)
        )?;
        return writer.flush();
    }

    writeln!(writer, "{}", relativize_to_cwd(file).bright_white().bold())?;
    for (idx, dest) in destinations.iter().enumerate() {
        let prefix = if idx + 1 == destinations.len() { "└──" } else { "├──" };
        writeln!(writer, "{}  {}", prefix.dimmed(), relativize_to_cwd(dest).blue())?;
    }
    writer.flush()
}

pub fn print_build_summary<W: Write>(writer: &mut W, outputs: &[BuildOutput]) -> io::Result<()> {
    for output in outputs {
        writeln!(
            writer,
            "{} {} ({} bytes)",
            "✓".green().bold(),
            relativize_to_cwd(&output.path),
            output.bytes.to_string().cyan()
        )?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxibundle_core::{BundleOptions, CommonOption};
    use oxibundle_trace::disk_collaborators;
    use std::{collections::HashMap, fs};
    use tempfile::TempDir;

    #[test]
    fn test_make_relative_child_dir() {
        let target = Path::new("/project/src/components/Button.tsx");
        assert_eq!(
            make_relative(target, Path::new("/project/src")),
            Some(PathBuf::from("components/Button.tsx"))
        );
    }

    #[test]
    fn test_make_relative_sibling_dir() {
        let target = Path::new("/project/apps/web/index.ts");
        assert_eq!(
            make_relative(target, Path::new("/project/apps/api")),
            Some(PathBuf::from("../web/index.ts"))
        );
    }

    #[test]
    fn test_make_relative_same_path() {
        let p = Path::new("/project/src");
        assert_eq!(make_relative(p, p), Some(PathBuf::from(".")));
    }

    #[test]
    fn test_make_relative_ancestor() {
        assert_eq!(
            make_relative(Path::new("/project"), Path::new("/project/apps/web")),
            Some(PathBuf::from("../.."))
        );
    }

    #[test]
    fn test_make_relative_no_shared_root() {
        assert_eq!(make_relative(Path::new("/project/a.js"), Path::new("project")), None);
    }

    fn bundle_with_shared_file(common: CommonOption) -> (TempDir, Bundle) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.js"), "import './shared';").unwrap();
        fs::write(root.join("src/b.js"), "import './shared';").unwrap();
        fs::write(root.join("src/shared.js"), "export const s = 1;").unwrap();

        let options = BundleOptions { common, ..BundleOptions::default() };
        let patterns = [
            root.join("src/a.js").to_string_lossy().to_string(),
            root.join("src/b.js").to_string_lossy().to_string(),
        ];
        let bundle =
            Bundle::new(disk_collaborators(root, HashMap::new()), &patterns, options).unwrap();
        (temp_dir, bundle)
    }

    #[test]
    fn test_print_partition_enabled() {
        colored::control::set_override(false);
        let (_dir, bundle) = bundle_with_shared_file(CommonOption::Enabled);
        let mut out = Vec::new();
        print_partition(&mut out, &bundle).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Entries (2)"));
        assert!(text.contains("Common (1)"));
        assert!(text.contains("shared.js"));
        assert!(text.contains("No common destination"));
    }

    #[test]
    fn test_print_partition_disabled() {
        colored::control::set_override(false);
        let (_dir, bundle) = bundle_with_shared_file(CommonOption::Disabled);
        let mut out = Vec::new();
        print_partition(&mut out, &bundle).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Common extraction disabled (1 shared files)"));
        assert!(text.contains("Uncommon (3)"));
        assert!(!text.contains("No common destination"));
    }

    #[test]
    fn test_print_destinations_empty() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        print_destinations(&mut out, Path::new("/nowhere/x.js"), &[]).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("is not part of any bundle"));
    }
}
