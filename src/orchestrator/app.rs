//! 批量作业处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建存储和处理流程，确定后端是否可用
//! 2. **批量加载**：扫描上传目录中的作业图片
//! 3. **并发控制**：使用 Semaphore 限制同时处理的文档数量
//! 4. **全局统计**：汇总所有文档的终态
//!
//! 不处理单个文档的细节，委托给 `workflow::ProcessingPipeline`。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::ValidationError;
use crate::infrastructure::{MemoryStore, Store};
use crate::models::document::ProcessingStatus;
use crate::models::subject::Subject;
use crate::utils::logging::{log_documents_loaded, log_startup, print_final_stats};
use crate::workflow::{ProcessingPipeline, Upload};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// 应用主结构
pub struct App {
    config: Config,
    default_subject: Subject,
    pipeline: Arc<ProcessingPipeline>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(config.max_concurrent_documents);

        let default_subject = Subject::parse(&config.default_subject).ok_or_else(|| {
            ValidationError::UnsupportedSubject {
                subject: config.default_subject.clone(),
            }
        })?;

        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let pipeline = Arc::new(ProcessingPipeline::from_config(&config, store));

        Ok(Self {
            config,
            default_subject,
            pipeline,
        })
    }

    pub fn pipeline(&self) -> &Arc<ProcessingPipeline> {
        &self.pipeline
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        let files = self.scan_uploads()?;

        if files.is_empty() {
            warn!("⚠️ 上传目录中没有找到作业图片，程序结束");
            return Ok(ProcessingStats::default());
        }

        log_documents_loaded(files.len(), self.config.max_concurrent_documents);

        let stats = self.process_all(files).await?;
        print_final_stats(stats.completed, stats.errored, stats.failed, stats.total);
        Ok(stats)
    }

    /// 扫描上传目录（按文件名排序）
    fn scan_uploads(&self) -> Result<Vec<PathBuf>> {
        info!("\n📁 正在扫描上传目录: {}", self.config.upload_folder);

        let entries = std::fs::read_dir(&self.config.upload_folder)
            .with_context(|| format!("无法读取上传目录: {}", self.config.upload_folder))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && image_mime(path).is_some())
            .collect();
        files.sort();
        Ok(files)
    }

    /// 并发处理所有文档
    async fn process_all(&self, files: Vec<PathBuf>) -> Result<ProcessingStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_documents.max(1)));
        let user_id = Uuid::new_v4();
        let mut handles = Vec::new();

        for (idx, path) in files.into_iter().enumerate() {
            let index = idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let pipeline = self.pipeline.clone();
            let subject = infer_subject(&path, self.default_subject);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                process_file(&pipeline, user_id, subject, &path).await
            });
            handles.push((index, handle));
        }

        let mut stats = ProcessingStats {
            total: handles.len(),
            ..Default::default()
        };

        for (index, handle) in handles {
            match handle.await {
                Ok(Ok(ProcessingStatus::Completed)) => stats.completed += 1,
                Ok(Ok(_)) => stats.errored += 1,
                Ok(Err(e)) => {
                    error!("[文档 {}] ❌ 处理过程中发生错误: {:#}", index, e);
                    stats.failed += 1;
                }
                Err(e) => {
                    error!("[文档 {}] 任务执行失败: {}", index, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}

async fn process_file(
    pipeline: &ProcessingPipeline,
    user_id: Uuid,
    subject: Subject,
    path: &Path,
) -> Result<ProcessingStatus> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("读取文件失败: {}", path.display()))?;

    let upload = Upload {
        user_id,
        subject: subject.name().to_string(),
        file_name: path.display().to_string(),
        content_type: image_mime(path).unwrap_or("application/octet-stream").to_string(),
        bytes,
    };

    let document = pipeline.submit(&upload).await?;
    Ok(document.processing_status)
}

/// 从文件名推断科目
pub fn infer_subject(path: &Path, default: Subject) -> Subject {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(Subject::find)
        .unwrap_or(default)
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some(match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "image/jpeg",
    })
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total: usize,
    /// 进入 completed
    pub completed: usize,
    /// 进入 error
    pub errored: usize,
    /// 校验失败或任务异常
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_comes_from_file_name() {
        let default = Subject::English;
        assert_eq!(
            infer_subject(Path::new("uploads/math_hw_03.png"), default),
            Subject::Mathematics
        );
        assert_eq!(
            infer_subject(Path::new("uploads/hebrew-reading.jpg"), default),
            Subject::Hebrew
        );
        assert_eq!(infer_subject(Path::new("uploads/scan01.jpg"), default), default);
    }

    #[test]
    fn only_images_are_picked_up() {
        assert_eq!(image_mime(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(image_mime(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("a.webp")), Some("image/webp"));
        assert_eq!(image_mime(Path::new("notes.txt")), None);
        assert_eq!(image_mime(Path::new("README")), None);
    }

    #[tokio::test]
    async fn run_processes_every_image_in_folder() {
        let dir = std::env::temp_dir().join(format!("homework-app-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let img = image::RgbImage::new(32, 32);
        img.save(dir.join("math_01.png")).unwrap();
        img.save(dir.join("english_02.png")).unwrap();
        std::fs::write(dir.join("notes.txt"), "skip me").unwrap();

        let config = Config {
            upload_folder: dir.display().to_string(),
            max_concurrent_documents: 1,
            ..Config::default()
        };
        let stats = App::initialize(config).unwrap().run().await.unwrap();

        assert_eq!(
            stats,
            ProcessingStats {
                total: 2,
                completed: 2,
                errored: 0,
                failed: 0,
            }
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
