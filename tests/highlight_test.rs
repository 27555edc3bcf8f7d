use rocq_stats::analyzer::Project;
use rocq_stats::extract::{extract, highlight_declaration};
use rocq_stats::highlight::{
    HighlightTag, Highlighter, Vocabulary, VocabularyError, COQ_KEYWORDS, COQ_TACTICS,
};
use rocq_stats::scanner::{SourceFile, FALLBACK_WINDOW};

fn tags<'a>(tokens: &'a [rocq_stats::highlight::HighlightedToken]) -> Vec<(HighlightTag, &'a str)> {
    tokens
        .iter()
        .filter(|t| !t.text.trim().is_empty())
        .map(|t| (t.tag, t.text.as_str()))
        .collect()
}

#[test]
fn test_builtin_lists_are_disjoint() {
    let checked = Vocabulary::new(COQ_KEYWORDS.iter().copied(), COQ_TACTICS.iter().copied());
    assert!(checked.is_ok());
}

#[test]
fn test_overlapping_lists_are_rejected() {
    let result = Vocabulary::new(["Qed", "apply", "rewrite"], ["rewrite", "apply", "auto"]);
    assert_eq!(
        result.err(),
        Some(VocabularyError::Overlap(vec![
            "apply".to_string(),
            "rewrite".to_string()
        ]))
    );
}

#[test]
fn test_tags() {
    let vocabulary = Vocabulary::coq();
    let highlighter = Highlighter::new(&vocabulary);
    let source = "Proof. intros x. (* hint *) exact \"s\" my_lemma. Qed.";
    let tokens = highlighter.highlight(source);

    assert_eq!(
        tags(&tokens),
        vec![
            (HighlightTag::Keyword, "Proof"),
            (HighlightTag::Other, ". "),
            (HighlightTag::Tactic, "intros"),
            (HighlightTag::Plain, "x"),
            (HighlightTag::Other, ". "),
            (HighlightTag::Comment, "(* hint *)"),
            (HighlightTag::Tactic, "exact"),
            (HighlightTag::String, "\"s\""),
            (HighlightTag::Plain, "my_lemma"),
            (HighlightTag::Other, ". "),
            (HighlightTag::Keyword, "Qed"),
            (HighlightTag::Other, "."),
        ]
    );
    let rebuilt: String = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(rebuilt, source);
}

#[test]
fn test_vocabulary_is_case_sensitive() {
    let vocabulary = Vocabulary::coq();
    assert!(vocabulary.is_keyword("Set"));
    assert!(!vocabulary.is_tactic("Set"));
    assert!(vocabulary.is_tactic("set"));
    assert!(!vocabulary.is_keyword("set"));
    assert!(!vocabulary.is_keyword("qed"));
}

#[test]
fn test_custom_vocabulary() {
    let vocabulary = Vocabulary::new(["Goal"], ["smash"]).expect("disjoint");
    let highlighter = Highlighter::new(&vocabulary);
    let tokens = highlighter.highlight("Goal smash Qed");

    assert_eq!(
        tags(&tokens),
        vec![
            (HighlightTag::Keyword, "Goal"),
            (HighlightTag::Tactic, "smash"),
            (HighlightTag::Plain, "Qed"),
        ]
    );
}

const FILE: &str = r#"(* Helper about zero. *)
Lemma add_0_r : forall n, n + 0 = n.
Proof. induction n; simpl; auto. Qed.

Theorem add_comm : forall n m, n + m = m + n.
Proof.
  intros n m. rewrite add_0_r.
Admitted.

Lemma add_0_r : True. Proof. trivial. Qed.
"#;

#[test]
fn test_extract_found() {
    let vocabulary = Vocabulary::coq();
    let highlighter = Highlighter::new(&vocabulary);
    let extraction = extract(FILE, "theories/Add.v", "add_comm", &highlighter);

    assert!(extraction.is_found());
    let declaration = extraction.declaration.as_ref().expect("found");
    assert_eq!(declaration.header_line, 5);
    assert_eq!(declaration.end_line, 8);
    assert_eq!(declaration.source_file.to_str(), Some("theories/Add.v"));

    let rebuilt: String = extraction.tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(rebuilt, declaration.body_text);
    assert_eq!(extraction.tokens, highlight_declaration(declaration, &highlighter));
    assert!(extraction
        .tokens
        .iter()
        .any(|t| t.tag == HighlightTag::Keyword && t.text == "Admitted"));
}

#[test]
fn test_extract_agrees_with_build_on_name_collision() {
    let vocabulary = Vocabulary::coq();
    let highlighter = Highlighter::new(&vocabulary);
    let extraction = extract(FILE, "Add.v", "add_0_r", &highlighter);

    // The later declaration shadows the earlier one.
    let declaration = extraction.declaration.as_ref().expect("found");
    assert_eq!(declaration.header_line, 10);
    assert!(declaration.comment().is_empty());

    let project = Project::build("add", vec![SourceFile::new("Add.v", FILE)], FALLBACK_WINDOW);
    let report = project.report(Some(&highlighter));
    assert_eq!(report.highlights["add_0_r"], extraction.tokens);
    assert_eq!(
        project.declaration("add_0_r").map(|d| d.header_line),
        Some(declaration.header_line)
    );
}

#[test]
fn test_extract_not_found() {
    let vocabulary = Vocabulary::coq();
    let highlighter = Highlighter::new(&vocabulary);
    let extraction = extract(FILE, "Add.v", "add_assoc", &highlighter);

    assert!(!extraction.is_found());
    assert!(extraction.tokens.is_empty());
}
