use ext_sorter::{NO_EXTENSION, classify};

#[test]
fn category_is_lowercase_text_after_last_dot() {
    for (name, want) in [
        ("a.txt", "txt"),
        ("B.TXT", "txt"),
        ("photo.JpEg", "jpeg"),
        ("archive.tar.GZ", "gz"),
        ("v1.2.3.log", "log"),
    ] {
        assert_eq!(classify(name).as_str(), want, "{name}");
    }
}

#[test]
fn names_without_a_usable_extension_share_the_fallback() {
    for name in ["README", "notes.", ".bashrc", ".", ""] {
        let c = classify(name);
        assert!(c.is_fallback(), "{name:?} -> {c}");
        assert_eq!(c.as_str(), NO_EXTENSION);
    }
}

#[test]
fn classification_is_pure() {
    let names = ["x.Rs", "y", "z.md", ".env"];
    let first: Vec<_> = names.iter().map(|n| classify(n)).collect();
    let second: Vec<_> = names.iter().map(|n| classify(n)).collect();
    assert_eq!(first, second);
}
