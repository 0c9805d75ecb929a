use crate::select::file_extension;
use log;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

pub const FALLBACK_LANGUAGE: &str = "nohighlight";

/// Name-to-language lookup. Implementations must not read file contents.
pub trait LanguageClassifier {
    fn lookup_by_filename(&self, file_name: &str) -> Option<&str>;
}

// Exact file names, checked before the extension.
static FILENAME_LANGUAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("Makefile", "makefile"),
        ("makefile", "makefile"),
        ("GNUmakefile", "makefile"),
        ("Dockerfile", "docker"),
        ("CMakeLists.txt", "cmake"),
        ("Rakefile", "ruby"),
        ("Gemfile", "ruby"),
        ("Vagrantfile", "ruby"),
        ("Jenkinsfile", "groovy"),
        ("Cargo.lock", "toml"),
        (".bashrc", "bash"),
        (".bash_profile", "bash"),
        (".zshrc", "bash"),
    ]
    .into_iter()
    .collect()
});

static EXTENSION_LANGUAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("py", "python"),
        ("pyw", "python"),
        ("pyi", "python"),
        ("java", "java"),
        ("js", "javascript"),
        ("mjs", "javascript"),
        ("cjs", "javascript"),
        ("jsx", "jsx"),
        ("ts", "typescript"),
        ("mts", "typescript"),
        ("tsx", "tsx"),
        ("c", "c"),
        ("h", "c"),
        ("cpp", "c++"),
        ("cc", "c++"),
        ("cxx", "c++"),
        ("hpp", "c++"),
        ("hh", "c++"),
        ("hxx", "c++"),
        ("C", "c++"),
        ("H", "c++"),
        ("cs", "c#"),
        ("rb", "ruby"),
        ("rake", "ruby"),
        ("gemspec", "ruby"),
        ("go", "go"),
        ("rs", "rust"),
        ("kt", "kotlin"),
        ("kts", "kotlin"),
        ("swift", "swift"),
        ("scala", "scala"),
        ("groovy", "groovy"),
        ("gradle", "groovy"),
        ("php", "php"),
        ("pl", "perl"),
        ("pm", "perl"),
        ("lua", "lua"),
        ("r", "r"),
        ("R", "r"),
        ("hs", "haskell"),
        ("ml", "ocaml"),
        ("mli", "ocaml"),
        ("fs", "f#"),
        ("ex", "elixir"),
        ("exs", "elixir"),
        ("erl", "erlang"),
        ("clj", "clojure"),
        ("dart", "dart"),
        ("zig", "zig"),
        ("nim", "nim"),
        ("m", "objective-c"),
        ("sh", "bash"),
        ("bash", "bash"),
        ("zsh", "bash"),
        ("ps1", "powershell"),
        ("bat", "batchfile"),
        ("sql", "sql"),
        ("html", "html"),
        ("htm", "html"),
        ("css", "css"),
        ("scss", "scss"),
        ("less", "less"),
        ("vue", "vue"),
        ("json", "json"),
        ("yaml", "yaml"),
        ("yml", "yaml"),
        ("toml", "toml"),
        ("ini", "ini"),
        ("xml", "xml"),
        ("md", "markdown"),
        ("markdown", "markdown"),
        ("rst", "restructuredtext"),
        ("tex", "tex"),
        ("proto", "protobuf"),
        ("tf", "terraform"),
        ("cmake", "cmake"),
        ("dockerfile", "docker"),
        ("graphql", "graphql"),
    ]
    .into_iter()
    .collect()
});

/// Built-in extension and file-name table, with optional user overrides
/// (keys are extensions or exact file names).
#[derive(Debug, Clone, Default)]
pub struct ExtensionTable {
    overrides: HashMap<String, String>,
}

impl ExtensionTable {
    pub fn with_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let overrides = overrides
            .into_iter()
            .map(|(key, tag)| {
                let key: String = key.into();
                (
                    key.trim_start_matches('.').to_string(),
                    tag.as_ref().to_lowercase(),
                )
            })
            .filter(|(key, tag)| !key.is_empty() && !tag.is_empty())
            .collect();
        Self { overrides }
    }

    fn lookup_override(&self, file_name: &str) -> Option<&str> {
        if self.overrides.is_empty() {
            return None;
        }
        self.overrides
            .get(file_name)
            .or_else(|| file_extension(file_name).and_then(|ext| self.overrides.get(ext)))
            .map(String::as_str)
    }
}

impl LanguageClassifier for ExtensionTable {
    fn lookup_by_filename(&self, file_name: &str) -> Option<&str> {
        if let Some(tag) = self.lookup_override(file_name) {
            return Some(tag);
        }
        if let Some(tag) = FILENAME_LANGUAGES.get(file_name) {
            return Some(*tag);
        }
        let ext = file_extension(file_name)?;
        EXTENSION_LANGUAGES
            .get(ext)
            .or_else(|| EXTENSION_LANGUAGES.get(ext.to_lowercase().as_str()))
            .copied()
    }
}

/// Language tag for `path` from the built-in table.
pub fn detect_language(path: impl AsRef<Path>) -> String {
    detect_language_with(&ExtensionTable::default(), path)
}

/// Lowercase language tag for `path`, or [`FALLBACK_LANGUAGE`] when the
/// classifier has no answer.
pub fn detect_language_with(classifier: &dyn LanguageClassifier, path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let Some(file_name) = path.file_name() else {
        log::trace!("No usable file name for: {}", path.display());
        return FALLBACK_LANGUAGE.to_string();
    };
    // Replacement chars never form a known name, so lossy decoding is safe
    let file_name = file_name.to_string_lossy();
    match classifier.lookup_by_filename(&file_name) {
        Some(tag) if !tag.trim().is_empty() => tag.to_lowercase(),
        _ => {
            log::trace!("No language known for '{}', using fallback", file_name);
            FALLBACK_LANGUAGE.to_string()
        }
    }
}
