//! Static catalog of known languages and their file extensions.
//!
//! Covers the languages the service hosts and their common extensions.

use crate::model::Language;

/// Known languages as `(id, display name)`.
const LANGUAGES: &[(&str, &str)] = &[
	("c", "C"),
	("fortran", "Fortran"),
	("c++", "C++"),
	("cppx", "Cppx"),
	("assembly", "Assembly"),
	("cuda", "CUDA"),
	("llvm", "LLVM IR"),
	("d", "D"),
	("ispc", "ispc"),
	("analysis", "Analysis"),
	("go", "Go"),
	("rust", "Rust"),
	("clean", "Clean"),
	("pascal", "Pascal"),
	("haskell", "Haskell"),
	("ada", "Ada"),
	("ocaml", "OCaml"),
	("swift", "Swift"),
	("zig", "Zig"),
];

/// File extension to language id.
const EXTENSIONS: &[(&str, &str)] = &[
	("c", "c"),
	("m", "c"),
	("f90", "fortran"),
	("f95", "fortran"),
	("f03", "fortran"),
	("cpp", "c++"),
	("cc", "c++"),
	("cxx", "c++"),
	("h", "c++"),
	("hpp", "c++"),
	("mm", "c++"),
	("asm", "assembly"),
	("s", "assembly"),
	("cuda", "cuda"),
	("llvm", "llvm"),
	("ll", "llvm"),
	("ir", "llvm"),
	("d", "d"),
	("go", "go"),
	("rs", "rust"),
	("icl", "clean"),
	("dcl", "clean"),
	("abc", "clean"),
	("pas", "pascal"),
	("hs", "haskell"),
	("ada", "ada"),
	("ml", "ocaml"),
	("mli", "ocaml"),
	("swift", "swift"),
	("zig", "zig"),
];

/// Preferred extension for each language id when saving.
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
	("c", "c"),
	("fortran", "f03"),
	("c++", "cpp"),
	("assembly", "asm"),
	("cuda", "cuda"),
	("llvm", "llvm"),
	("d", "d"),
	("go", "go"),
	("rust", "rs"),
	("clean", "icl"),
	("pascal", "pas"),
	("haskell", "hs"),
	("ada", "ada"),
	("ocaml", "ml"),
	("swift", "swift"),
	("zig", "zig"),
];

/// Returns every language in the catalog.
pub fn languages() -> impl Iterator<Item = Language> {
	LANGUAGES.iter().map(|&(id, name)| Language::new(id, name))
}

/// Looks up a catalog language by service id.
pub fn language(id: &str) -> Option<Language> {
	LANGUAGES
		.iter()
		.find(|(known, _)| *known == id)
		.map(|&(id, name)| Language::new(id, name))
}

/// Returns the language associated with a file extension (without the dot).
pub fn language_for_extension(ext: &str) -> Option<Language> {
	let ext = ext.to_ascii_lowercase();
	EXTENSIONS.iter().find(|(known, _)| *known == ext).and_then(|(_, id)| language(id))
}

/// Returns the preferred file extension for a language, or `""` if unknown.
pub fn file_extension(language: &Language) -> &'static str {
	PREFERRED_EXTENSIONS
		.iter()
		.find(|(id, _)| *id == language.id)
		.map_or("", |(_, ext)| ext)
}

/// Returns every extension with a known language.
pub fn all_extensions() -> impl Iterator<Item = &'static str> {
	EXTENSIONS.iter().map(|(ext, _)| *ext)
}
