use booker::build::{build_site, Error};
use booker::config::Config;
use booker::tree::Error as TreeError;
use std::fs;
use std::path::Path;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

fn site(root: &Path) -> std::io::Result<()> {
    write(&root.join("site.yaml"), "title: Field Guide\nauthor: Someone\n")?;
    write(&root.join("theme/theme.yaml"), "theme_name: plain\nraw_files_dir: raw\n")?;
    write(&root.join("theme/raw/style.css"), "body {}\n")?;
    write(
        &root.join("theme/templates/page.html"),
        "<title>{{.title}} - {{.site.title}}</title>{{.contents}}\
         {{with .effective_next}}<a rel=\"next\" href=\"{{.link}}\">{{.short_title}}</a>{{end}}",
    )?;
    write(
        &root.join("theme/templates/contents.html"),
        "{{range .pages}}<li>{{.sequence_number}} {{.link}}</li>{{end}}",
    )?;

    let pages = root.join("pages");
    write(&pages.join("0.md"), "---\ntitle: Home\n---\nWelcome. Start with [the intro](Intro).\n")?;
    write(
        &pages.join("10 Intro.md"),
        "---\ntitle: Introduction\nshort_title: Intro\n---\nSee [setup](setup.md#install).\n",
    )?;
    write(&pages.join("20 Setup/0.md"), "# Setup\n\n![diagram](diagram.png)\n")?;
    write(&pages.join("20 Setup/10 Linux.md"), "Linux notes.\n#NoPublish\nsecret\n")?;
    write(&pages.join("20 Setup/diagram.png"), "png")?;
    write(&pages.join("30 Wip.md"), "---\ndraft: true\n---\nnot yet\n")?;
    write(&pages.join("40 Contents.md"), "---\nindex: true\ntemplate: contents.html\n---\n")?;
    Ok(())
}

#[test]
fn test_build_site() -> TestResult {
    let dir = tempfile::tempdir()?;
    site(dir.path())?;
    let config = Config::from_directory(dir.path())?;

    let (tree, pages) = build_site(&config)?;
    let names: Vec<&str> = pages.iter().map(|id| tree[*id].output_name.as_str()).collect();
    assert_eq!(
        vec!["index.html", "Intro.html", "Setup.html", "Linux.html", "Contents.html"],
        names
    );

    let out = dir.path().join("out");
    let home = fs::read_to_string(out.join("index.html"))?;
    assert!(home.contains("<title>Home - Field Guide</title>"));
    assert!(home.contains(r#"href="Intro.html""#));

    let intro = fs::read_to_string(out.join("Intro.html"))?;
    assert!(intro.contains(r#"href="Setup.html#install""#));
    assert!(intro.contains(r#"<a rel="next" href="Setup.html">"#));

    let linux = fs::read_to_string(out.join("Linux.html"))?;
    assert!(linux.contains("Linux notes."));
    assert!(!linux.contains("secret"));

    assert!(!out.join("Wip.html").exists());
    assert!(out.join("diagram.png").is_file());
    assert!(out.join("style.css").is_file());

    let contents = fs::read_to_string(out.join("Contents.html"))?;
    assert!(contents.contains("<li>.2.1 Linux.html</li>"));
    assert!(!contents.contains("Wip.html"));
    Ok(())
}

#[test]
fn test_missing_root_document_keeps_previous_output() -> TestResult {
    let dir = tempfile::tempdir()?;
    site(dir.path())?;
    let config = Config::from_directory(dir.path())?;
    build_site(&config)?;

    fs::remove_file(dir.path().join("pages/20 Setup/0.md"))?;
    match build_site(&config) {
        Err(Error::Tree(TreeError::MissingRootDocument { directory })) => {
            assert_eq!(dir.path().join("pages/20 Setup"), directory);
        }
        other => panic!("expected MissingRootDocument, got {:?}", other.map(|_| ())),
    }
    assert!(dir.path().join("out/Linux.html").is_file());
    Ok(())
}
