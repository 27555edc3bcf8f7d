use rocq_stats::classifier::Category;
use rocq_stats::scanner::{
    scan, DeclKind, Declaration, Scanner, SourceFile, TOP_LEVEL_SECTION, TRUNCATION_MARKER,
};

fn scan_str(code: &str) -> Vec<Declaration> {
    scan(&SourceFile::new("Test.v", code))
}

fn names(declarations: &[Declaration]) -> Vec<&str> {
    declarations.iter().map(|d| d.name.as_str()).collect()
}

#[test]
fn test_comment_above_header_marks_main() {
    let code = "(* main theorem *)\nLemma L1 : True.\nProof. auto. Qed.";
    let declarations = scan_str(code);

    assert_eq!(declarations.len(), 1);
    let d = &declarations[0];
    assert_eq!(d.name, "L1");
    assert_eq!(d.kind(), DeclKind::Lemma);
    assert_eq!(d.category(), Category::Main);
    assert_eq!(d.comment(), "main theorem");
    assert_eq!(d.start_line, 1, "Starts at the comment line");
    assert_eq!(d.header_line, 2);
    assert_eq!(d.end_line, 3);
    assert!(d.terminated);
    assert_eq!(d.body_text, code);
}

#[test]
fn test_header_inside_comment_is_ignored() {
    let code = r#"(* Lemma ghost : False. Qed. *)
Lemma real : True.
Proof. trivial. Qed.
"#;
    let declarations = scan_str(code);

    assert_eq!(names(&declarations), vec!["real"]);
    assert_eq!(declarations[0].category(), Category::Helper);
}

#[test]
fn test_header_inside_string_is_ignored() {
    let code = r#""Lemma fake : True."
Definition s := "Qed.".
Lemma real : True.
Proof. trivial. Qed.
"#;
    let declarations = scan_str(code);
    assert_eq!(names(&declarations), vec!["real"]);
}

#[test]
fn test_every_kind_and_keyword_case() {
    let code = r#"Lemma a : True. Proof. trivial. Qed.
THEOREM b : True. Proof. trivial. Qed.
corollary c : True. Proof. trivial. Qed.
Proposition d : True. Proof. trivial. Defined.
Fact e : True. Proof. trivial. Qed.
Remark f' : True. Proof. trivial. Admitted.
"#;
    let declarations = scan_str(code);

    assert_eq!(names(&declarations), vec!["a", "b", "c", "d", "e", "f'"]);
    let kinds: Vec<DeclKind> = declarations.iter().map(|d| d.kind()).collect();
    assert_eq!(kinds, DeclKind::ALL.to_vec());
    assert_eq!(declarations[1].category(), Category::Main, "Theorems are main");
    assert!(declarations.iter().all(|d| d.terminated));
    assert!(declarations.iter().all(|d| d.start_line == d.end_line));
}

#[test]
fn test_zero_declarations() {
    assert!(scan_str("").is_empty());
    assert!(scan_str("Definition x := 1.\nFixpoint f (n : nat) := n.\n").is_empty());
}

#[test]
fn test_missing_terminator_uses_short_file_end() {
    let code = "Lemma open_one : True.\nProof.\n  auto.\n";
    let declarations = scan_str(code);

    assert_eq!(declarations.len(), 1);
    let d = &declarations[0];
    assert!(!d.terminated);
    assert_eq!(d.end_line, 4, "Capped at the last line of the file");
    assert!(d.body_text.ends_with(TRUNCATION_MARKER));
    assert_eq!(d.proof_lines, 2);
}

#[test]
fn test_missing_terminator_caps_at_fallback_window() {
    let mut code = String::from("Lemma long_one : True.\nProof.\n");
    for _ in 0..80 {
        code.push_str("  idtac.\n");
    }
    let declarations = scan_str(&code);

    assert_eq!(declarations.len(), 1);
    let d = &declarations[0];
    assert!(!d.terminated);
    assert_eq!(d.start_line, 1);
    assert_eq!(d.end_line, 51, "start_line + 50");
    assert_eq!(d.body_text.lines().count(), 52, "51 source lines and the marker");
    assert_eq!(d.body_text.lines().last(), Some(TRUNCATION_MARKER));
}

#[test]
fn test_custom_fallback_window() {
    let code = "Lemma a : True.\nProof.\n  idtac.\n  idtac.\n  idtac.\n  idtac.\n";
    let file = SourceFile::new("Short.v", code);
    let declarations = Scanner::new(&file).with_fallback_window(2).scan();

    assert_eq!(declarations.len(), 1);
    assert_eq!(declarations[0].end_line, 3);
}

#[test]
fn test_abort_is_not_a_terminator() {
    let code = r#"Lemma e : True.
Proof.
Abort.
Lemma f : True.
Proof. trivial. Qed.
"#;
    let declarations = scan_str(code);

    // `e` stays open until the next terminator and swallows `f`.
    assert_eq!(names(&declarations), vec!["e"]);
    assert_eq!(declarations[0].end_line, 5);
    assert!(declarations[0].body_text.contains("Lemma f"));
}

#[test]
fn test_terminator_in_comment_does_not_close() {
    let code = r#"Lemma g : True.
Proof.
  (* Qed. *)
  trivial.
Qed.
"#;
    let declarations = scan_str(code);

    assert_eq!(declarations.len(), 1);
    assert_eq!(declarations[0].end_line, 5);
    assert_eq!(declarations[0].proof_lines, 3, "The comment-only line is not counted");
}

#[test]
fn test_sections() {
    let code = r#"Section Foo.
Lemma a : True. Proof. trivial. Qed.
Section Bar.
Lemma b : True. Proof. trivial. Qed.
End Bar.
Lemma c : True. Proof. trivial. Qed.
End Foo.
Lemma d : True. Proof. trivial. Qed.
"#;
    let declarations = scan_str(code);
    let sections: Vec<&str> = declarations.iter().map(|d| d.section.as_str()).collect();

    assert_eq!(sections, vec!["Foo", "Bar", "Foo", TOP_LEVEL_SECTION]);
}

#[test]
fn test_nearest_comment_wins_across_blank_lines() {
    let code = r#"(* far comment, main *)

(* near comment *)

Lemma c : True.
Proof. trivial. Qed.
"#;
    let declarations = scan_str(code);
    let d = &declarations[0];

    assert_eq!(d.comment(), "near comment");
    assert_eq!(d.start_line, 3);
    assert_eq!(d.category(), Category::Helper);
}

#[test]
fn test_comment_behind_other_code_is_not_attached() {
    let code = r#"(* main result *)
Definition helper := 0.
Lemma d : True. Proof. trivial. Qed.
Definition x := 1. (* main *)
Lemma e : True. Proof. trivial. Qed.
"#;
    let declarations = scan_str(code);

    assert_eq!(names(&declarations), vec!["d", "e"]);
    assert!(declarations.iter().all(|d| d.comment().is_empty()));
    assert!(declarations.iter().all(|d| d.category() == Category::Helper));
    assert_eq!(declarations[0].start_line, 3);
}

#[test]
fn test_comment_is_not_shared_with_previous_declaration() {
    let code = r#"(* main lemma *)
Lemma a : True. Proof. trivial. Qed.
Lemma b : True. Proof. trivial. Qed.
"#;
    let declarations = scan_str(code);

    assert!(declarations[0].is_main());
    assert!(declarations[1].comment().is_empty());
    assert_eq!(declarations[1].start_line, 3);
}

#[test]
fn test_multiline_comment_is_cleaned() {
    let code = r#"(** The main
  * commutativity
  * result. *)
Lemma add_comm : forall n m : nat,
  n + m = m + n.
Proof.
  intros n m.
  lia.
Qed.
"#;
    let declarations = scan_str(code);
    let d = &declarations[0];

    assert_eq!(d.comment(), "The main commutativity result.");
    assert_eq!(d.start_line, 1);
    assert_eq!(d.header_line, 4);
    assert_eq!(d.end_line, 9);
    assert_eq!(
        d.signature,
        "Lemma add_comm : forall n m : nat, n + m = m + n."
    );
    assert_eq!(d.proof_lines, 4);
}

#[test]
fn test_declarations_do_not_overlap() {
    let code = r#"Lemma a : True.
Proof. trivial. Qed. Lemma b : True. Proof. trivial. Qed.
Lemma c : True. Proof. trivial. Qed.
"#;
    let declarations = scan_str(code);

    // `b` shares its line with the terminator of `a`, so it is never seen.
    assert_eq!(names(&declarations), vec!["a", "c"]);
    for pair in declarations.windows(2) {
        assert!(pair[0].end_line < pair[1].start_line);
    }
}

#[test]
fn test_source_file_is_recorded() {
    let file = SourceFile::new("theories/Nat.v", "Lemma a : True. Proof. trivial. Qed.");
    let declarations = scan(&file);
    assert_eq!(declarations[0].source_file, file.path());
}

#[test]
fn test_category_follows_kind_and_comment() {
    let mut d = Declaration::new("x", DeclKind::Lemma, "X.v");
    assert_eq!(d.category(), Category::Helper);

    d.set_comment("MAIN statement");
    assert!(d.is_main());

    d.set_comment("auxiliary");
    assert_eq!(d.category(), Category::Helper);

    d.set_kind(DeclKind::Theorem);
    assert!(d.is_main(), "Theorems are main whatever the comment");

    let built = Declaration::new("y", DeclKind::Fact, "Y.v").with_comment("the main fact");
    assert_eq!(built.category(), Category::Main);
    assert_eq!(DeclKind::from_keyword("cOrOlLaRy"), Some(DeclKind::Corollary));
    assert_eq!(DeclKind::from_keyword("Definition"), None);
}
