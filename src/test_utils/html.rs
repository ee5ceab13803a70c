//! HTML pages for link discovery tests.

/// A landing page listing one anchor per `href`, between unrelated markup.
pub fn landing_page(hrefs: &[&str]) -> String {
    let items: String = hrefs
        .iter()
        .enumerate()
        .map(|(i, href)| format!("      <li><a class=\"download\" href=\"{}\">Fichier {}</a></li>\n", href, i + 1))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
  <head><title>Immatriculations</title></head>
  <body>
    <nav><a href="/">Accueil</a><a>sans lien</a></nav>
    <ul>
{}    </ul>
  </body>
</html>
"#,
        items
    )
}
