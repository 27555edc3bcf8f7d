//! Example: Debug Scanner
//!
//! This example runs the `Scanner` and the resolver on an inline proof script
//! and prints what they found. It is useful for checking header detection,
//! comment attachment and the fallback window by eye.

use rocq_stats::highlight::{Highlighter, Vocabulary};
use rocq_stats::resolver::resolve;
use rocq_stats::scanner::{Scanner, SourceFile};

/// Main entry point for the debug example.
fn main() {
    let source = r#"
Section Arith.

(* Helper: zero is a right unit. *)
Lemma add_0_r : forall n, n + 0 = n.
Proof. induction n; simpl; auto. Qed.

(* The main result of this file. *)
Lemma add_comm : forall n m, n + m = m + n.
Proof.
  intros n m. induction n; simpl.
  - rewrite add_0_r. reflexivity.
  - admit.
Admitted.

End Arith.

(* Lemma ghost : False. Qed. *)
Theorem open_problem : True.
Proof.
  trivial.
"#;

    let file = SourceFile::new("Arith.v", source);
    let mut declarations = Scanner::new(&file).with_fallback_window(10).scan();
    let graph = resolve(&mut declarations);

    println!("=== DECLARATIONS ===");
    for d in &declarations {
        println!(
            "{} {} [{}] lines {}-{} ({}, {} proof lines{})",
            d.kind(),
            d.name,
            d.section,
            d.start_line,
            d.end_line,
            d.category(),
            d.proof_lines,
            if d.terminated { "" } else { ", truncated" }
        );
        if !d.comment().is_empty() {
            println!("    comment: {}", d.comment());
        }
        println!("    signature: {}", d.signature);
    }

    println!("\n=== DEPENDENCIES ===");
    for edge in graph.edges() {
        println!("{} -> {}", edge.from, edge.to);
    }

    // Show how the highlighter tags the first body.
    let vocabulary = Vocabulary::coq();
    let highlighter = Highlighter::new(&vocabulary);
    if let Some(first) = declarations.first() {
        println!("\n=== TOKENS ({}) ===", first.name);
        for token in highlighter.highlight(&first.body_text) {
            if !token.text.trim().is_empty() {
                println!("{:?}: {:?}", token.tag, token.text);
            }
        }
    }
}
