//! Internationalization (i18n) module
//!
//! Provides language detection and localized strings for console output.
//! Supports English and Chinese Simplified.
//! Note: Log messages remain in English for consistency.

use std::sync::OnceLock;

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    ChineseSimplified,
}

/// Global language instance
static LANGUAGE: OnceLock<Language> = OnceLock::new();

/// Initialize and get the current language based on system locale
pub fn get_language() -> Language {
    *LANGUAGE.get_or_init(detect_language)
}

/// Detect system language from environment variables
fn detect_language() -> Language {
    let locale = std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LC_MESSAGES"))
        .or_else(|_| std::env::var("LANG"))
        .unwrap_or_default();
    language_for_locale(&locale)
}

fn language_for_locale(locale: &str) -> Language {
    let locale = locale.to_lowercase();
    if locale.starts_with("zh") || locale.contains("chinese") || locale.contains("hans") {
        Language::ChineseSimplified
    } else {
        Language::English
    }
}

/// Localized strings for the console
pub struct Strings;

impl Strings {
    pub fn start_processing() -> &'static str {
        match get_language() {
            Language::English => "Processing directory:",
            Language::ChineseSimplified => "开始处理目录:",
        }
    }

    pub fn processing_complete() -> &'static str {
        match get_language() {
            Language::English => "Processing complete!",
            Language::ChineseSimplified => "处理完成！",
        }
    }

    pub fn stat_found() -> &'static str {
        match get_language() {
            Language::English => "Photo/video files found",
            Language::ChineseSimplified => "找到照片/视频文件",
        }
    }

    pub fn stat_moved() -> &'static str {
        match get_language() {
            Language::English => "Moved",
            Language::ChineseSimplified => "成功移动",
        }
    }

    pub fn stat_skipped() -> &'static str {
        match get_language() {
            Language::English => "Skipped",
            Language::ChineseSimplified => "跳过",
        }
    }

    pub fn stat_already_classified() -> &'static str {
        match get_language() {
            Language::English => "Already in year-month folders",
            Language::ChineseSimplified => "已在年月目录中",
        }
    }

    pub fn stat_renumbered() -> &'static str {
        match get_language() {
            Language::English => "Existing files renumbered",
            Language::ChineseSimplified => "已有文件重新编号",
        }
    }

    pub fn time_sources() -> &'static str {
        match get_language() {
            Language::English => "Time sources",
            Language::ChineseSimplified => "时间来源",
        }
    }

    pub fn provenance_exif() -> &'static str {
        match get_language() {
            Language::English => "EXIF",
            Language::ChineseSimplified => "EXIF",
        }
    }

    pub fn provenance_container() -> &'static str {
        match get_language() {
            Language::English => "Video metadata",
            Language::ChineseSimplified => "视频元数据",
        }
    }

    pub fn provenance_filesystem() -> &'static str {
        match get_language() {
            Language::English => "File time",
            Language::ChineseSimplified => "文件时间",
        }
    }

    pub fn detailed_results() -> &'static str {
        match get_language() {
            Language::English => "Detailed results:",
            Language::ChineseSimplified => "详细结果：",
        }
    }

    pub fn skipped_files() -> &'static str {
        match get_language() {
            Language::English => "Skipped files:",
            Language::ChineseSimplified => "跳过的文件：",
        }
    }

    pub fn finished_at() -> &'static str {
        match get_language() {
            Language::English => "Finished at",
            Language::ChineseSimplified => "处理结束时间",
        }
    }

    pub fn log_file() -> &'static str {
        match get_language() {
            Language::English => "Log file:",
            Language::ChineseSimplified => "日志文件:",
        }
    }

    pub fn processing_failed() -> &'static str {
        match get_language() {
            Language::English => "Error while processing photos:",
            Language::ChineseSimplified => "处理照片时出错:",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detection() {
        // This test just ensures the function doesn't panic
        let _lang = detect_language();
    }

    #[test]
    fn test_locale_mapping() {
        assert_eq!(language_for_locale("zh_CN.UTF-8"), Language::ChineseSimplified);
        assert_eq!(language_for_locale("zh-Hans"), Language::ChineseSimplified);
        assert_eq!(language_for_locale("en_US.UTF-8"), Language::English);
        assert_eq!(language_for_locale(""), Language::English);
    }

    #[test]
    fn test_strings_exist() {
        assert!(!Strings::processing_complete().is_empty());
        assert!(!Strings::stat_moved().is_empty());
        assert!(!Strings::provenance_container().is_empty());
    }
}
