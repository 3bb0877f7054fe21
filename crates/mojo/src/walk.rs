use camino::Utf8Path;
use camino::Utf8PathBuf;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

/// Filters applied when walking directories for templates.
#[derive(Clone, Debug, Default)]
pub struct WalkOptions {
    /// Include hidden files and directories.
    pub hidden: bool,
    /// Do not read `.gitignore`, `.ignore` and friends.
    pub no_ignore: bool,
    /// Gitignore-style globs; a leading `!` excludes.
    pub globs: Vec<String>,
}

/// Collect the files under `paths` that pass `predicate`.
///
/// Files given directly are checked against `predicate` only; directories
/// are walked with the `ignore` crate's standard filters. The result is
/// sorted, deduplicated and canonicalized where possible.
#[must_use]
pub fn walk_files(
    paths: &[Utf8PathBuf],
    predicate: impl Fn(&Utf8Path) -> bool,
    options: &WalkOptions,
) -> Vec<Utf8PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if predicate(path) {
                files.push(canonical(path));
            }
            continue;
        }

        if !path.is_dir() {
            tracing::warn!(%path, "path does not exist, skipping");
            continue;
        }

        let mut builder = WalkBuilder::new(path.as_std_path());
        builder
            .standard_filters(!options.no_ignore)
            .hidden(!options.hidden);

        if !options.globs.is_empty() {
            let mut overrides = OverrideBuilder::new(path.as_std_path());
            for glob in &options.globs {
                if let Err(err) = overrides.add(glob) {
                    tracing::warn!(glob, error = %err, "invalid glob, ignoring");
                }
            }
            match overrides.build() {
                Ok(built) => {
                    builder.overrides(built);
                }
                Err(err) => tracing::warn!(error = %err, "could not build glob overrides"),
            }
        }

        for entry in builder.build().filter_map(Result::ok) {
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let Some(utf8) = Utf8Path::from_path(entry.path()) else {
                continue;
            };
            if predicate(utf8) {
                files.push(canonical(utf8));
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

fn canonical(path: &Utf8Path) -> Utf8PathBuf {
    dunce_utf8(path).unwrap_or_else(|_| path.to_owned())
}

fn dunce_utf8(path: &Utf8Path) -> std::io::Result<Utf8PathBuf> {
    let canonical = path.as_std_path().canonicalize()?;
    #[cfg(windows)]
    let canonical = dunce::simplified(&canonical).to_path_buf();
    Utf8PathBuf::from_path_buf(canonical)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "non-UTF-8 path"))
}
