//! Mapping from file names to Xcode file types.

use std::path::Path;

/// Source file kinds that Xcode records in `lastKnownFileType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Swift,
    ObjC,
    ObjCpp,
    C,
    Cpp,
    Header,
    Metal,
    CoreData,
    AssetCatalog,
    Storyboard,
    Xib,
    Plist,
    Text,
}

impl FileType {
    /// Classify a file by its extension. Unknown extensions map to [`FileType::Text`].
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("swift") => FileType::Swift,
            Some("m") => FileType::ObjC,
            Some("mm") => FileType::ObjCpp,
            Some("c") => FileType::C,
            Some("cpp" | "cc" | "cxx") => FileType::Cpp,
            Some("h" | "hpp") => FileType::Header,
            Some("metal") => FileType::Metal,
            Some("xcdatamodeld") => FileType::CoreData,
            Some("xcassets") => FileType::AssetCatalog,
            Some("storyboard") => FileType::Storyboard,
            Some("xib") => FileType::Xib,
            Some("plist") => FileType::Plist,
            _ => FileType::Text,
        }
    }

    /// The `lastKnownFileType` value Xcode writes for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Swift => "sourcecode.swift",
            FileType::ObjC => "sourcecode.c.objc",
            FileType::ObjCpp => "sourcecode.cpp.objcpp",
            FileType::C => "sourcecode.c.c",
            FileType::Cpp => "sourcecode.cpp.cpp",
            FileType::Header => "sourcecode.c.h",
            FileType::Metal => "sourcecode.metal",
            FileType::CoreData => "wrapper.xcdatamodel",
            FileType::AssetCatalog => "folder.assetcatalog",
            FileType::Storyboard => "file.storyboard",
            FileType::Xib => "file.xib",
            FileType::Plist => "text.plist.xml",
            FileType::Text => "text",
        }
    }

    /// Whether files of this kind are compiled by a sources build phase.
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            FileType::Swift
                | FileType::ObjC
                | FileType::ObjCpp
                | FileType::C
                | FileType::Cpp
                | FileType::Metal
                | FileType::CoreData
        )
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name Xcode shows for a file: its last path component.
pub fn display_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}
