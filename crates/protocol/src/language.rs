use std::path::Path;

/// Extensions eligible for local indexing, keyed with their leading dot, and
/// the language identifier reported for each.
pub const LANGUAGE_BY_EXTENSION: &[(&str, &str)] = &[
    (".c", "c"),
    (".h", "c"),
    (".cpp", "cpp"),
    (".cc", "cpp"),
    (".cxx", "cpp"),
    (".hpp", "cpp"),
    (".cs", "csharp"),
    (".dart", "dart"),
    (".go", "go"),
    (".hcl", "hcl"),
    (".java", "java"),
    (".js", "javascript"),
    (".mjs", "javascript"),
    (".cjs", "javascript"),
    (".json", "json"),
    (".jsonc", "json"),
    (".jsx", "jsx"),
    (".kt", "kotlin"),
    (".kts", "kotlin"),
    (".lua", "lua"),
    (".php", "php"),
    (".ps1", "powershell"),
    (".py", "python"),
    (".r", "r"),
    (".rb", "ruby"),
    (".rs", "rust"),
    (".scala", "scala"),
    (".sh", "shell"),
    (".zsh", "shell"),
    (".bash", "shell"),
    (".sql", "sql"),
    (".sv", "systemVerilog"),
    (".svh", "systemVerilog"),
    (".swift", "swift"),
    (".tf", "tf"),
    (".ts", "typescript"),
    (".tsx", "tsx"),
    (".vue", "vue"),
    (".yaml", "yaml"),
    (".yml", "yaml"),
];

/// Language identifiers the assistant understands. Anything else is dropped
/// from aggregated documents.
pub const RECOGNIZED_LANGUAGES: &[&str] = &[
    "c",
    "cpp",
    "csharp",
    "dart",
    "go",
    "hcl",
    "java",
    "javascript",
    "json",
    "jsx",
    "kotlin",
    "lua",
    "php",
    "plaintext",
    "powershell",
    "python",
    "r",
    "ruby",
    "rust",
    "scala",
    "shell",
    "sql",
    "swift",
    "systemVerilog",
    "tf",
    "tsx",
    "typescript",
    "vue",
    "yaml",
];

pub fn default_file_extensions() -> Vec<String> {
    LANGUAGE_BY_EXTENSION
        .iter()
        .map(|(ext, _)| (*ext).to_string())
        .collect()
}

pub fn is_recognized_language(language: &str) -> bool {
    RECOGNIZED_LANGUAGES.contains(&language)
}

/// Detect the language of a file from its extension (case-insensitive).
pub fn language_for_path(path: impl AsRef<Path>) -> Option<&'static str> {
    let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
    LANGUAGE_BY_EXTENSION
        .iter()
        .find(|(candidate, _)| candidate.strip_prefix('.') == Some(ext.as_str()))
        .map(|(_, language)| *language)
}
