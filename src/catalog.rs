use memmap2::Mmap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use zip::ZipArchive;

use crate::error::{MappingError, Result};

/// Top-level classes in a jar, as dotted names.
pub fn catalog(jar_path: &Path) -> Result<Vec<String>> {
    let file = File::open(jar_path).map_err(|e| MappingError::io(jar_path, e))?;
    // SAFETY: The file is opened read-only and remains valid for the lifetime of the mmap.
    // The mmap is dropped before the file, ensuring memory safety.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| MappingError::io(jar_path, e))?;
    let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
        .map_err(|e| MappingError::io(jar_path, std::io::Error::other(e)))?;

    let mut classes = Vec::new();
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| MappingError::io(jar_path, std::io::Error::other(e)))?;
        let name = entry.name();
        if !name.ends_with(".class") || name.contains('$') {
            continue;
        }
        classes.push(name.trim_end_matches(".class").replace(['/', '\\'], "."));
    }
    classes.sort();
    Ok(classes)
}

/// Fails unless the remapper left at least one class in `jar_path`.
pub fn ensure_remapped(jar_path: &Path) -> Result<usize> {
    if !jar_path.exists() {
        return Err(MappingError::ToolExecution {
            tool: "remapper".to_string(),
            message: format!("no output at {}", jar_path.display()),
        });
    }
    let classes = catalog(jar_path)?;
    if classes.is_empty() {
        return Err(MappingError::ToolExecution {
            tool: "remapper".to_string(),
            message: format!("{} contains no classes", jar_path.display()),
        });
    }
    Ok(classes.len())
}

#[cfg(test)]
pub(crate) fn write_jar(path: &Path, entries: &[(&str, &[u8])]) -> anyhow::Result<()> {
    use std::io::Write;
    use zip::write::FileOptions;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(content)?;
    }

    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::temp_path;

    #[test]
    fn catalog_lists_top_level_classes() -> anyhow::Result<()> {
        let dir = temp_path("catalog_ok");
        let jar = dir.join("1.20.1.jar");
        write_jar(
            &jar,
            &[
                ("net/minecraft/Foo.class", b""),
                ("net/minecraft/Foo$Inner.class", b""),
                ("META-INF/MANIFEST.MF", b""),
            ],
        )?;

        assert_eq!(catalog(&jar)?, vec!["net.minecraft.Foo".to_string()]);
        assert_eq!(ensure_remapped(&jar)?, 1);
        std::fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn ensure_remapped_rejects_empty_or_missing_jar() -> anyhow::Result<()> {
        let dir = temp_path("catalog_empty");
        let jar = dir.join("empty.jar");
        write_jar(&jar, &[("META-INF/MANIFEST.MF", b"")])?;

        assert!(matches!(
            ensure_remapped(&jar),
            Err(MappingError::ToolExecution { .. })
        ));
        assert!(matches!(
            ensure_remapped(&dir.join("missing.jar")),
            Err(MappingError::ToolExecution { .. })
        ));
        std::fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn catalog_reports_corrupt_archive() -> anyhow::Result<()> {
        let dir = temp_path("catalog_corrupt");
        std::fs::create_dir_all(&dir)?;
        let jar = dir.join("broken.jar");
        std::fs::write(&jar, b"not a zip")?;

        assert!(matches!(catalog(&jar), Err(MappingError::Io { .. })));
        std::fs::remove_dir_all(dir)?;
        Ok(())
    }
}
