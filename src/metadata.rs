use crate::record::CandidateRecord;
use crate::sanitize::truncate_chars;

pub const MAX_VIDEO_TITLE_CHARS: usize = 100;
pub const VIDEO_CATEGORY_ID: &str = "24";
pub const VIDEO_TAGS: &[&str] = &["manhwa", "manga", "srankmanga"];

const TITLE_SUFFIX_LONG: &str = " is S-RANK Material 🤯 #shorts";
const TITLE_PREFIX_SHORT: &str = "Read ";
const TITLE_SUFFIX_SHORT: &str = " Now! 😱 #shorts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

pub fn narration_script(record: &CandidateRecord) -> String {
    format!(
        "If you need a new S-Rank series, read {}. {}. This is a certified hidden gem. \
         Read it now on our website, link in the comments.",
        record.title, record.description
    )
}

/// Always at most [`MAX_VIDEO_TITLE_CHARS`] characters.
pub fn video_title(manga_title: &str) -> String {
    let long = format!("{manga_title}{TITLE_SUFFIX_LONG}");
    if long.chars().count() <= MAX_VIDEO_TITLE_CHARS {
        return long;
    }

    let frame = TITLE_PREFIX_SHORT.chars().count() + TITLE_SUFFIX_SHORT.chars().count();
    let room = MAX_VIDEO_TITLE_CHARS.saturating_sub(frame);
    let name = truncate_chars(manga_title, room).trim_end();
    format!("{TITLE_PREFIX_SHORT}{name}{TITLE_SUFFIX_SHORT}")
}

pub fn video_metadata(record: &CandidateRecord, website_url: &str) -> VideoMetadata {
    VideoMetadata {
        title: video_title(&record.title),
        description: format!(
            "Welcome to S Rank Manga.\n\nRead here: {website_url}\n\n#manhwa #manga #srankmanga"
        ),
        tags: VIDEO_TAGS.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn pinned_comment(record: &CandidateRecord, website_url: &str) -> String {
    format!("🔥 Read {} here: {}", record.title, website_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> CandidateRecord {
        CandidateRecord {
            title: title.to_string(),
            link: "https://asura.test/s".into(),
            image: "https://x/cover.png".into(),
            description: "A hunter returns".into(),
        }
    }

    #[test]
    fn short_titles_use_hype_format() {
        assert_eq!(
            video_title("Solo Max-Level Newbie"),
            "Solo Max-Level Newbie is S-RANK Material 🤯 #shorts"
        );
    }

    #[test]
    fn long_titles_switch_format() {
        let name = "The Max Level Hero Has Returned To Reclaim What Was Lost Long Ago Again!";
        let title = video_title(name);
        assert_eq!(title, format!("Read {name} Now! 😱 #shorts"));
        assert!(title.chars().count() <= MAX_VIDEO_TITLE_CHARS);
    }

    #[test]
    fn very_long_titles_are_cut_to_fit() {
        let name = "Endless ".repeat(30);
        let title = video_title(&name);
        assert!(title.chars().count() <= MAX_VIDEO_TITLE_CHARS);
        assert!(title.starts_with("Read Endless"));
        assert!(title.ends_with(" Now! 😱 #shorts"));
        assert!(!title.contains("  "));
    }

    #[test]
    fn metadata_carries_site_and_tags() {
        let meta = video_metadata(&record("Solo Max-Level Newbie"), "https://me.github.io/m/");
        assert!(meta.description.contains("Read here: https://me.github.io/m/"));
        assert_eq!(meta.tags, ["manhwa", "manga", "srankmanga"]);
    }

    #[test]
    fn script_and_comment_mention_title() {
        let rec = record("Solo Max-Level Newbie");
        let script = narration_script(&rec);
        assert!(script.starts_with("If you need a new S-Rank series, read Solo Max-Level Newbie. A hunter returns."));
        assert_eq!(
            pinned_comment(&rec, "https://me.github.io/m/"),
            "🔥 Read Solo Max-Level Newbie here: https://me.github.io/m/"
        );
    }
}
