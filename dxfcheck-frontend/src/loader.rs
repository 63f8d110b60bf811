use std::path::{Path, PathBuf};

use dxfcheck_core::document::Document;
use dxfcheck_io::{DocumentLoader, DxfFacade};
use tracing::info;

use crate::errors::FrontendError;

/// 加载后的文档及其来源路径。
#[derive(Debug)]
pub struct LoadedDocument {
    pub document: Document,
    pub source: PathBuf,
}

/// 使用默认 ASCII DXF 读取器加载文档。
pub fn load_document(path: &Path) -> Result<LoadedDocument, FrontendError> {
    load_with(&DxfFacade::new(), path)
}

pub fn load_with<L: DocumentLoader>(
    loader: &L,
    path: &Path,
) -> Result<LoadedDocument, FrontendError> {
    let document = loader.load(path)?;
    info!(
        path = %path.display(),
        entity_count = document.entity_count(),
        paper_space_count = document.paper_space_entity_count(),
        layer_count = document.layers().count(),
        "从 DXF 加载文档成功"
    );
    Ok(LoadedDocument {
        document,
        source: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use dxfcheck_core::geometry::Point2;
    use dxfcheck_io::IoError;

    use super::*;

    struct FixedLoader;

    impl DocumentLoader for FixedLoader {
        fn load(&self, _path: &Path) -> Result<Document, IoError> {
            let mut document = Document::new();
            document.add_text(Point2::new(0.0, 0.0), "101", "Planon_space_number");
            Ok(document)
        }
    }

    #[test]
    fn custom_loader_is_used() {
        let loaded = load_with(&FixedLoader, Path::new("virtual.dxf")).unwrap();
        assert_eq!(loaded.document.entity_count(), 1);
        assert_eq!(loaded.source, PathBuf::from("virtual.dxf"));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_document(Path::new("/definitely/not/here.dxf")).unwrap_err();
        assert!(matches!(err, FrontendError::Load(IoError::ReadError { .. })));
    }
}
