use crate::error::{AppError, Result};
use crate::language::{ExtensionTable, LanguageClassifier, detect_language_with};
use crate::select::{FileFilter, select_files, validate_root};
use log;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub files: usize,
    pub bytes: u64,
}

/// Bundles every selected file under `root` into `output_path` using the
/// built-in language table.
pub fn aggregate(root: &Path, output_path: &Path, filter: &FileFilter) -> Result<AggregateStats> {
    aggregate_with(root, output_path, filter, &ExtensionTable::default())
}

/// Truncates `output_path` and writes one fenced record per selected file.
///
/// The root is checked before the output is created. A read failure aborts
/// the run and leaves the records written so far on disk. The output file is
/// never bundled into itself.
pub fn aggregate_with(
    root: &Path,
    output_path: &Path,
    filter: &FileFilter,
    classifier: &dyn LanguageClassifier,
) -> Result<AggregateStats> {
    validate_root(root)?;

    let file = File::create(output_path).map_err(|e| AppError::FileWrite {
        path: output_path.to_path_buf(),
        source: e,
    })?;
    // Canonicalized after creation so the comparison works for new files too
    let own_output = output_path.canonicalize().ok();
    log::info!(
        "Bundling files from {} into {}",
        root.display(),
        output_path.display()
    );

    let mut writer = BufWriter::new(file);
    let stats = bundle_into(
        root,
        &mut writer,
        output_path,
        filter,
        classifier,
        own_output.as_deref(),
    )?;
    writer.flush().map_err(|e| AppError::FileWrite {
        path: output_path.to_path_buf(),
        source: e,
    })?;

    log::info!(
        "Wrote {} files ({} bytes of content) to {}",
        stats.files,
        stats.bytes,
        output_path.display()
    );
    Ok(stats)
}

/// Same document as [`aggregate_with`], written to an arbitrary sink.
///
/// `sink` names the destination in write errors (e.g. `<stdout>`).
pub fn write_bundle<W: Write>(
    root: &Path,
    writer: &mut W,
    sink: &Path,
    filter: &FileFilter,
    classifier: &dyn LanguageClassifier,
) -> Result<AggregateStats> {
    let stats = bundle_into(root, writer, sink, filter, classifier, None)?;
    writer.flush().map_err(|e| AppError::FileWrite {
        path: sink.to_path_buf(),
        source: e,
    })?;
    Ok(stats)
}

fn bundle_into<W: Write>(
    root: &Path,
    writer: &mut W,
    sink: &Path,
    filter: &FileFilter,
    classifier: &dyn LanguageClassifier,
    own_output: Option<&Path>,
) -> Result<AggregateStats> {
    let mut stats = AggregateStats::default();

    for selected in select_files(root, filter)? {
        let path = selected?;
        if is_own_output(&path, own_output) {
            log::debug!("Skipping the output file itself: {}", path.display());
            continue;
        }

        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let language = detect_language_with(classifier, &path);

        // Non UTF-8 content surfaces as InvalidData here
        let content = fs::read_to_string(&path).map_err(|e| AppError::FileRead {
            path: path.clone(),
            source: e,
        })?;
        log::debug!("Adding {} as {}", path.display(), language);

        write_entry(writer, &display_name, &language, &content).map_err(|e| {
            AppError::FileWrite {
                path: sink.to_path_buf(),
                source: e,
            }
        })?;
        stats.files += 1;
        stats.bytes += content.len() as u64;
    }

    if stats.files == 0 {
        log::warn!("No files matched under {}", root.display());
    }
    Ok(stats)
}

fn is_own_output(path: &Path, own_output: Option<&Path>) -> bool {
    let Some(own_output) = own_output else {
        return false;
    };
    // Cheap name check first; only a matching name pays for canonicalize
    if path.file_name() != own_output.file_name() {
        return false;
    }
    path.canonicalize().is_ok_and(|p| p == own_output)
}

/// One record: name line, opening fence with tag, contents plus newline,
/// closing fence, blank separator line.
pub fn write_entry<W: Write>(
    writer: &mut W,
    display_name: &str,
    language: &str,
    content: &str,
) -> io::Result<()> {
    writeln!(writer, "{}", display_name)?;
    writeln!(writer, "{}{}", FENCE, language)?;
    writer.write_all(content.as_bytes())?;
    writer.write_all(b"\n")?; // Always appended, even after a trailing newline
    writeln!(writer, "{}", FENCE)?;
    writer.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn entry_layout_is_exact() {
        let mut buf = Vec::new();
        write_entry(&mut buf, "test.py", "python", "print(1)").unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "test.py\n```python\nprint(1)\n```\n\n"
        );
    }

    #[test]
    fn entry_keeps_raw_content() {
        let mut buf = Vec::new();
        write_entry(&mut buf, "win.c", "c", "int x;\r\nint y;\n").unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "win.c\n```c\nint x;\r\nint y;\n\n```\n\n"
        );
    }

    #[test]
    fn write_bundle_streams_to_any_sink() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.go"), "package a").unwrap();
        fs::write(dir.path().join("b.txt"), "skip me").unwrap();

        let mut buf = Vec::new();
        let filter = FileFilter::new(["go"]);
        let stats = write_bundle(
            dir.path(),
            &mut buf,
            Path::new("<memory>"),
            &filter,
            &ExtensionTable::default(),
        )
        .unwrap();

        assert_eq!(stats, AggregateStats { files: 1, bytes: 9 });
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "a.go\n```go\npackage a\n```\n\n"
        );
    }

    #[test]
    fn output_inside_root_is_not_bundled() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.md"), "# hi").unwrap();
        let output = dir.path().join("bundle.md");

        let filter = FileFilter::new(["md"]);
        aggregate(dir.path(), &output, &filter).unwrap();
        let first = fs::read_to_string(&output).unwrap();
        aggregate(dir.path(), &output, &filter).unwrap();
        let second = fs::read_to_string(&output).unwrap();

        assert_eq!(first, "notes.md\n```markdown\n# hi\n```\n\n");
        assert_eq!(first, second);
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failures_name_the_sink() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.go"), "package a").unwrap();

        let err = write_bundle(
            dir.path(),
            &mut BrokenSink,
            Path::new("<stdout>"),
            &FileFilter::new(["go"]),
            &ExtensionTable::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "File Write Error: Path '<stdout>', Error: closed"
        );
        match err {
            AppError::FileWrite { path, source } => {
                assert_eq!(path, Path::new("<stdout>"));
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_is_a_read_error() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x").unwrap();
        let link = dir.path().join("link.py");
        symlink(dir.path().join("gone.py"), &link).unwrap();

        let mut buf = Vec::new();
        let err = write_bundle(
            dir.path(),
            &mut buf,
            Path::new("<memory>"),
            &FileFilter::new(["py"]),
            &ExtensionTable::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::FileRead { ref path, .. } if path == &link));
        assert_eq!(String::from_utf8(buf).unwrap(), "a.py\n```python\nx\n```\n\n");
    }
}
