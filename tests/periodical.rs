use periodical::package::Packager;
use periodical::{Periodical, PeriodicalMeta, RawItem, RawSubscription};
use std::path::Path;
use std::time::Duration;

fn meta() -> PeriodicalMeta {
    PeriodicalMeta {
        title: "My Periodical".to_owned(),
        creator: "Jane Doe".to_owned(),
        publisher: "Jane Doe".to_owned(),
        subject: "Periodical".to_owned(),
        description: "Set of news articles in one .mobi file".to_owned(),
        output_filename: "my_news".to_owned(),
    }
}

fn news() -> Vec<RawSubscription> {
    vec![RawSubscription {
        title: "News".to_owned(),
        items: vec![RawItem::new("x:1_a", 1_700_000_000_000)
            .with_title("Hello")
            .with_content("<p>World</p>")],
    }]
}

fn read(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn renders_single_item_periodical() {
    let dir = tempfile::tempdir().unwrap();
    let periodical = Periodical::new(meta(), dir.path())
        .unwrap()
        .with_packager(None);

    let generated = periodical.generate(news()).unwrap();
    assert_eq!(generated.artifact, None);
    assert_eq!(generated.cleaned, None);
    assert_eq!(generated.documents, 4);
    assert_eq!(
        file_names(dir.path()),
        vec!["content.opf", "contents.html", "nav-contents.ncx", "x1a.html"]
    );

    let article = read(dir.path(), "x1a.html");
    assert!(article.contains("Hello"));
    assert!(article.contains("World"));
    assert!(article.contains("<p>World</p>"));
    assert!(article.contains(r#"<meta name="description" content="World" />"#));

    assert!(read(dir.path(), "contents.html").contains(r#"href="x1a.html""#));
    assert!(read(dir.path(), "content.opf").contains(r#"idref="item-x1a""#));
    assert!(read(dir.path(), "nav-contents.ncx").contains("Hello - 14/11/2023"));
}

#[test]
fn unpublished_items_are_left_out() {
    let dir = tempfile::tempdir().unwrap();
    let periodical = Periodical::new(meta(), dir.path())
        .unwrap()
        .with_packager(None);
    let mut content = news();
    content[0].items.push(RawItem {
        id: "draft_1".to_owned(),
        title: Some("Draft".to_owned()),
        content: Some("unfinished".to_owned()),
        published: None,
    });

    periodical.generate(content).unwrap();

    assert!(!dir.path().join("draft1.html").exists());
    for name in &["contents.html", "content.opf", "nav-contents.ncx"] {
        let contents = read(dir.path(), name);
        assert!(!contents.contains("draft1"), "{} mentions the draft", name);
        assert!(!contents.contains("Draft"), "{} mentions the draft", name);
    }
}

#[test]
fn nothing_to_publish_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let working = dir.path().join("temp");
    let periodical = Periodical::new(meta(), &working)
        .unwrap()
        .with_packager(None);
    let content = vec![
        RawSubscription {
            title: "Quiet".to_owned(),
            items: Vec::new(),
        },
        RawSubscription {
            title: "Drafts".to_owned(),
            items: vec![RawItem {
                id: "a".to_owned(),
                ..RawItem::default()
            }],
        },
    ];

    let err = periodical.generate(content).unwrap_err();
    assert!(err.is_no_content());
    assert_eq!(err.to_string(), "no unread items available");
    assert!(working.is_dir());
    assert!(file_names(&working).is_empty());
}

#[cfg(unix)]
mod converter {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::sync::Mutex;

    static SPAWN_LOCK: Mutex<()> = Mutex::new(());

    fn fake_converter(dir: &Path, status: i32) -> PathBuf {
        let path = dir.join("kindlegen");
        std::fs::write(&path, format!("#!/bin/sh\nexit {}\n", status)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn periodical(scratch: &Path, converter: PathBuf) -> Periodical {
        Periodical::new(meta(), scratch.join("temp"))
            .unwrap()
            .with_packager(Some(Packager {
                converter,
                timeout: Some(Duration::from_secs(10)),
            }))
    }

    #[test]
    fn failing_converter_keeps_intermediate_files() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let periodical = periodical(dir.path(), fake_converter(dir.path(), 2));

        let generated = periodical.generate(news()).unwrap();
        assert_eq!(generated.artifact, None);
        assert_eq!(generated.cleaned, None);
        assert_eq!(file_names(periodical.working_directory()).len(), 4);
    }

    #[test]
    fn successful_conversion_cleans_up() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let periodical = periodical(dir.path(), fake_converter(dir.path(), 0));

        let generated = periodical.generate(news()).unwrap();
        assert_eq!(generated.artifact, Some(PathBuf::from("my_news.mobi")));
        assert_eq!(generated.cleaned, Some(true));
        assert!(file_names(periodical.working_directory()).is_empty());
    }

    #[test]
    fn keep_intermediate_skips_cleanup() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let periodical =
            periodical(dir.path(), fake_converter(dir.path(), 1)).keep_intermediate(true);

        let generated = periodical.generate(news()).unwrap();
        assert_eq!(generated.artifact, Some(PathBuf::from("my_news.mobi")));
        assert_eq!(generated.cleaned, None);
        assert_eq!(file_names(periodical.working_directory()).len(), 4);
    }
}
