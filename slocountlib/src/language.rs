//! The language registry: detection and lexical rules for every
//! supported language.
//!
//! Each [`LanguageSpec`] is pure data. The classifier and the line
//! counter both consult the same table, so adding a language means
//! adding an entry here, not a code branch elsewhere.
//!
//! Classification priority is fixed: exact filename, then shebang,
//! then extension. Extensions claimed by more than one language
//! (`.h`, `.m`) are resolved by deterministic content sniffing with a
//! fixed fallback (see [`Registry::classify`]).

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Serialize, Serializer};

/// An open/close pair delimiting a block comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDelims {
    pub open: &'static str,
    pub close: &'static str,
    /// Delimiters recognized only at the start of a line (Ruby's
    /// `=begin`/`=end`)
    pub column0: bool,
}

impl BlockDelims {
    const fn pair(open: &'static str, close: &'static str) -> Self {
        Self {
            open,
            close,
            column0: false,
        }
    }

    const fn column0(mut self) -> Self {
        self.column0 = true;
        self
    }
}

/// A string literal delimiter with its escape rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringDelims {
    /// Opening and closing delimiter (longer delimiters must come
    /// first in a spec's list so they win the match)
    pub delim: &'static str,
    /// Escape character; an escaped delimiter does not close the string
    pub escape: Option<char>,
    /// Whether the literal may span physical lines
    pub multiline: bool,
}

/// Detection and lexical rules for one language.
#[derive(Debug, PartialEq, Eq)]
pub struct LanguageSpec {
    /// Unique display name, also the report key
    pub name: &'static str,
    /// Extensions claimed by this language (no leading dot), matched
    /// case-insensitively
    pub extensions: &'static [&'static str],
    /// Extensions claimed only with this exact case (`.C` is C++,
    /// `.c` is not)
    pub exact_extensions: &'static [&'static str],
    /// Exact filenames claimed by this language
    pub filenames: &'static [&'static str],
    /// Interpreter substrings recognized on a `#!` first line
    pub shebangs: &'static [&'static str],
    /// Markers starting a comment that runs to end of line
    pub line_comments: &'static [&'static str],
    /// Block comment delimiter pairs
    pub block_comments: &'static [BlockDelims],
    /// Whether block comments nest
    pub nested_blocks: bool,
    /// String literal delimiters
    pub strings: &'static [StringDelims],
    /// A `#!` first line counts as code (cloc convention for scripts)
    pub shebang_is_code: bool,
}

impl LanguageSpec {
    const fn new(name: &'static str, extensions: &'static [&'static str]) -> Self {
        Self {
            name,
            extensions,
            exact_extensions: &[],
            filenames: &[],
            shebangs: &[],
            line_comments: &[],
            block_comments: &[],
            nested_blocks: false,
            strings: &[],
            shebang_is_code: false,
        }
    }

    const fn filenames(mut self, filenames: &'static [&'static str]) -> Self {
        self.filenames = filenames;
        self
    }

    const fn shebangs(mut self, shebangs: &'static [&'static str]) -> Self {
        self.shebangs = shebangs;
        self
    }

    const fn line_comments(mut self, markers: &'static [&'static str]) -> Self {
        self.line_comments = markers;
        self
    }

    const fn block_comments(mut self, pairs: &'static [BlockDelims]) -> Self {
        self.block_comments = pairs;
        self
    }

    const fn nested(mut self) -> Self {
        self.nested_blocks = true;
        self
    }

    const fn strings(mut self, strings: &'static [StringDelims]) -> Self {
        self.strings = strings;
        self
    }

    const fn exact_extensions(mut self, extensions: &'static [&'static str]) -> Self {
        self.exact_extensions = extensions;
        self
    }

    const fn shebang_code(mut self) -> Self {
        self.shebang_is_code = true;
        self
    }
}

/// Serialized as the language name, which is what reports key on.
impl Serialize for LanguageSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

const DQ: StringDelims = StringDelims {
    delim: "\"",
    escape: Some('\\'),
    multiline: false,
};
const SQ: StringDelims = StringDelims {
    delim: "'",
    escape: Some('\\'),
    multiline: false,
};
const DQ_ML: StringDelims = StringDelims {
    delim: "\"",
    escape: Some('\\'),
    multiline: true,
};
const BACKTICK_ML: StringDelims = StringDelims {
    delim: "`",
    escape: None,
    multiline: true,
};
const TRIPLE_DQ: StringDelims = StringDelims {
    delim: "\"\"\"",
    escape: Some('\\'),
    multiline: true,
};
const TRIPLE_SQ: StringDelims = StringDelims {
    delim: "'''",
    escape: Some('\\'),
    multiline: true,
};

const C_BLOCKS: &[BlockDelims] = &[BlockDelims::pair("/*", "*/")];
const QUOTES: &[StringDelims] = &[DQ, SQ];
const SLASHES: &[&str] = &["//"];
const HASH: &[&str] = &["#"];
const DASHES: &[&str] = &["--"];

/// The static language table.
///
/// Table order is the deterministic tie-break for shebang matching and
/// for extension collisions that content sniffing cannot resolve.
pub static LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec::new("C", &["c", "h"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .strings(QUOTES),
    LanguageSpec::new("C++", &["cpp", "cc", "cxx", "c++", "hpp", "hh", "hxx"])
        .exact_extensions(&["C"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .strings(QUOTES),
    LanguageSpec::new("Objective-C", &["m", "mm", "h"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .strings(QUOTES),
    LanguageSpec::new("C#", &["cs"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .strings(QUOTES),
    LanguageSpec::new("Rust", &["rs"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .nested()
        .strings(&[DQ_ML]),
    LanguageSpec::new("Go", &["go"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .strings(&[BACKTICK_ML, DQ, SQ]),
    LanguageSpec::new("Java", &["java"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .strings(QUOTES),
    LanguageSpec::new("Kotlin", &["kt", "kts"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .nested()
        .strings(&[TRIPLE_DQ, DQ]),
    LanguageSpec::new("Scala", &["scala"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .strings(&[TRIPLE_DQ, DQ]),
    LanguageSpec::new("Swift", &["swift"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .nested()
        .strings(&[DQ]),
    LanguageSpec::new("Python", &["py", "pyw"])
        .shebangs(&["python"])
        .shebang_code()
        .line_comments(HASH)
        .strings(&[TRIPLE_DQ, TRIPLE_SQ, DQ, SQ]),
    LanguageSpec::new("Ruby", &["rb", "rake"])
        .filenames(&["Rakefile", "Gemfile"])
        .shebangs(&["ruby"])
        .shebang_code()
        .line_comments(HASH)
        .block_comments(&[BlockDelims::pair("=begin", "=end").column0()])
        .strings(QUOTES),
    LanguageSpec::new("Perl", &["pl", "pm"])
        .shebangs(&["perl"])
        .shebang_code()
        .line_comments(HASH)
        .strings(QUOTES),
    LanguageSpec::new("PHP", &["php", "php3", "php4", "php5"])
        .shebangs(&["php"])
        .shebang_code()
        .line_comments(&["//", "#"])
        .block_comments(C_BLOCKS)
        .strings(QUOTES),
    LanguageSpec::new("JavaScript", &["js", "mjs", "cjs"])
        .shebangs(&["node"])
        .shebang_code()
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .strings(&[BACKTICK_ML, DQ, SQ]),
    LanguageSpec::new("TypeScript", &["ts", "tsx", "mts"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .strings(&[BACKTICK_ML, DQ, SQ]),
    LanguageSpec::new("Bourne Shell", &["sh", "bash", "zsh", "ksh"])
        .shebangs(&["bash", "zsh", "ksh", "sh"])
        .shebang_code()
        .line_comments(HASH)
        .strings(&[
            DQ,
            StringDelims {
                delim: "'",
                escape: None,
                multiline: false,
            },
        ]),
    LanguageSpec::new("Lua", &["lua"])
        .shebangs(&["lua"])
        .shebang_code()
        .line_comments(DASHES)
        .block_comments(&[BlockDelims::pair("--[[", "]]")])
        .strings(QUOTES),
    LanguageSpec::new("Haskell", &["hs", "lhs"])
        .line_comments(DASHES)
        .block_comments(&[BlockDelims::pair("{-", "-}")])
        .nested()
        .strings(&[DQ]),
    LanguageSpec::new("SQL", &["sql"])
        .line_comments(DASHES)
        .block_comments(C_BLOCKS)
        .strings(&[
            DQ,
            StringDelims {
                delim: "'",
                escape: None,
                multiline: false,
            },
        ]),
    LanguageSpec::new("HTML", &["html", "htm"])
        .block_comments(&[BlockDelims::pair("<!--", "-->")]),
    LanguageSpec::new("XML", &["xml", "xsd", "xsl", "svg"])
        .block_comments(&[BlockDelims::pair("<!--", "-->")]),
    LanguageSpec::new("CSS", &["css", "scss", "less"])
        .line_comments(SLASHES)
        .block_comments(C_BLOCKS)
        .strings(QUOTES),
    LanguageSpec::new("YAML", &["yaml", "yml"])
        .line_comments(HASH)
        .strings(QUOTES),
    LanguageSpec::new("TOML", &["toml"])
        .line_comments(HASH)
        .strings(&[TRIPLE_DQ, DQ, SQ]),
    LanguageSpec::new("JSON", &["json"]).strings(&[DQ]),
    LanguageSpec::new("MATLAB", &["m"])
        .line_comments(&["%"])
        .block_comments(&[BlockDelims::pair("%{", "%}")])
        .strings(&[DQ]),
    LanguageSpec::new("R", &["r"])
        .shebangs(&["Rscript"])
        .shebang_code()
        .line_comments(HASH)
        .strings(QUOTES),
    LanguageSpec::new("Pascal", &["pas", "pp"])
        .line_comments(SLASHES)
        .block_comments(&[BlockDelims::pair("(*", "*)"), BlockDelims::pair("{", "}")])
        .strings(&[StringDelims {
            delim: "'",
            escape: None,
            multiline: false,
        }]),
    LanguageSpec::new("make", &["mk"])
        .filenames(&["Makefile", "makefile", "GNUmakefile"])
        .line_comments(HASH)
        .strings(&[]),
    LanguageSpec::new("CMake", &["cmake"])
        .filenames(&["CMakeLists.txt"])
        .line_comments(HASH)
        .strings(&[DQ]),
    LanguageSpec::new("Dockerfile", &["dockerfile"])
        .filenames(&["Dockerfile", "Containerfile"])
        .line_comments(HASH)
        .strings(QUOTES),
];

/// Indexed view over [`LANGUAGES`], built once.
pub struct Registry {
    by_name: HashMap<&'static str, &'static LanguageSpec>,
    by_filename: HashMap<&'static str, &'static LanguageSpec>,
    /// Keyed by lowercased extension; a key may have several claimants
    by_ext: HashMap<String, Vec<&'static LanguageSpec>>,
}

/// The process-wide registry.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::build)
}

impl Registry {
    fn build() -> Self {
        let mut by_name = HashMap::new();
        let mut by_filename = HashMap::new();
        let mut by_ext: HashMap<String, Vec<&'static LanguageSpec>> = HashMap::new();

        for spec in LANGUAGES {
            by_name.insert(spec.name, spec);
            for filename in spec.filenames {
                by_filename.insert(*filename, spec);
            }
            for ext in spec.extensions.iter().chain(spec.exact_extensions) {
                by_ext.entry(ext.to_lowercase()).or_default().push(spec);
            }
        }

        Self {
            by_name,
            by_filename,
            by_ext,
        }
    }

    /// Look a language up by its display name.
    pub fn by_name(&self, name: &str) -> Option<&'static LanguageSpec> {
        self.by_name.get(name).copied()
    }

    /// Classify a file by filename, shebang, then extension, in that
    /// order. `peek` is a prefix of the file's content used for shebang
    /// and collision sniffing. `None` means unrecognized.
    pub fn classify(&self, path: &Path, peek: &[u8]) -> Option<&'static LanguageSpec> {
        let filename = path.file_name()?.to_str().unwrap_or_default();

        if let Some(spec) = self.by_filename.get(filename) {
            return Some(spec);
        }

        if let Some(spec) = self.classify_shebang(peek) {
            return Some(spec);
        }

        let ext = path.extension()?.to_str()?;
        self.classify_extension(ext, peek)
    }

    fn classify_shebang(&self, peek: &[u8]) -> Option<&'static LanguageSpec> {
        if !peek.starts_with(b"#!") {
            return None;
        }
        let first_line = match peek.iter().position(|&b| b == b'\n') {
            Some(end) => &peek[..end],
            None => peek,
        };
        let first_line = String::from_utf8_lossy(first_line);

        // Table order makes the match deterministic when interpreter
        // names overlap (e.g. "sh" is a substring of "bash", so Bourne
        // Shell lists "bash" before "sh").
        for spec in LANGUAGES {
            for interp in spec.shebangs {
                if first_line.contains(interp) {
                    return Some(spec);
                }
            }
        }
        None
    }

    fn classify_extension(&self, ext: &str, peek: &[u8]) -> Option<&'static LanguageSpec> {
        let candidates = self.by_ext.get(&ext.to_lowercase())?;

        let matching: Vec<&'static LanguageSpec> = candidates
            .iter()
            .copied()
            .filter(|spec| extension_matches(spec, ext))
            .collect();

        match matching.len() {
            0 => None,
            1 => Some(matching[0]),
            // An exact-case claim beats case-insensitive ones
            // (".C" is C++, ".c" is C).
            _ => {
                let exact: Vec<&'static LanguageSpec> = matching
                    .iter()
                    .copied()
                    .filter(|spec| spec.exact_extensions.contains(&ext))
                    .collect();
                if exact.len() == 1 {
                    return Some(exact[0]);
                }
                Some(disambiguate(ext, peek, &matching))
            }
        }
    }
}

fn extension_matches(spec: &LanguageSpec, ext: &str) -> bool {
    spec.exact_extensions.contains(&ext)
        || spec
            .extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
}

/// Resolve an extension claimed by several languages by sniffing the
/// content for language-distinguishing tokens. Pure and deterministic:
/// the fallback is always the first claimant in table order.
fn disambiguate(
    ext: &str,
    peek: &[u8],
    candidates: &[&'static LanguageSpec],
) -> &'static LanguageSpec {
    let text = String::from_utf8_lossy(peek);

    let pick = |name: &str| candidates.iter().copied().find(|s| s.name == name);

    match ext.to_lowercase().as_str() {
        // .h: Objective-C if its directives appear, C++ on its keywords,
        // plain C otherwise.
        "h" => {
            if has_objc_tokens(&text) {
                if let Some(spec) = registry().by_name("Objective-C") {
                    return spec;
                }
            }
            if has_cpp_tokens(&text) {
                if let Some(spec) = registry().by_name("C++") {
                    return spec;
                }
            }
            pick("C").unwrap_or(candidates[0])
        }
        // .m: Objective-C if its directives appear, MATLAB otherwise.
        "m" => {
            if has_objc_tokens(&text) {
                pick("Objective-C").unwrap_or(candidates[0])
            } else {
                pick("MATLAB").unwrap_or(candidates[0])
            }
        }
        _ => candidates[0],
    }
}

fn has_objc_tokens(text: &str) -> bool {
    ["@interface", "@implementation", "@protocol", "#import"]
        .iter()
        .any(|t| text.contains(t))
}

fn has_cpp_tokens(text: &str) -> bool {
    ["class ", "namespace ", "template<", "template <"]
        .iter()
        .any(|t| text.contains(t))
}
