use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;

use crate::error::{MappingError, Result};

/// Every `.java` file under a generated source tree.
pub fn scan_sources(base_path: &Path) -> Vec<PathBuf> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "java") {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut sources: Vec<PathBuf> = rx.iter().collect();
    sources.sort();
    sources
}

/// Relative path of a class's source file: `net.minecraft.Foo` -> `net/minecraft/Foo.java`.
/// Inner classes live in their outer class's file.
pub fn class_name_to_source_path(class_name: &str) -> Result<PathBuf> {
    let outer = class_name.split('$').next().unwrap_or(class_name);
    let relative = PathBuf::from(format!("{}.java", outer.replace('.', "/")));

    let only_normal = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if outer.is_empty() || !only_normal {
        return Err(MappingError::NotFound(format!("class {class_name}")));
    }
    Ok(relative)
}
