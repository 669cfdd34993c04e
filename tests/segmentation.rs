// Integration tests: full article page → ordered content blocks

use funcultural::{segment_html, BlockKind, Config, ContentBlock};
use pretty_assertions::assert_eq;
use scraper::Selector;
use url::Url;

fn selector() -> Selector {
    Selector::parse("article.noticia-conteudo").unwrap()
}

fn base() -> Url {
    Url::parse("https://funcultural.portovelho.ro.gov.br").unwrap()
}

fn segment(html: &str) -> Option<Vec<ContentBlock>> {
    segment_html(html, &selector(), &base(), &Config::default())
}

fn page(article: &str) -> String {
    format!(
        "<html><head><title>Notícia</title></head><body>\
         <nav><a href=\"/\">Início</a> <a href=\"/noticias\">Notícias</a></nav>\
         <article class=\"noticia-conteudo\">{article}</article>\
         <footer>Prefeitura de Porto Velho</footer></body></html>"
    )
}

fn kinds(blocks: &[ContentBlock]) -> Vec<BlockKind> {
    blocks.iter().map(|b| b.kind).collect()
}

#[test]
fn test_typical_article() {
    let html = page(
        "<div class=\"artigo-img-wrap\"><img src=\"/uploads/capa.jpg\"></div>\
         <div class=\"artigo-img-wrap\"><img src=\"/uploads/palco.jpg\"></div>\
         <script>var x = 1;</script>\
         <h2>Programação completa do festival de teatro</h2>\
         <p>O festival reúne grupos de teatro de todo o estado nesta edição.</p>\
         <p>   </p>\
         <p>As apresentações acontecem no Teatro Municipal durante toda a semana.</p>\
         <p>A entrada é gratuita e as senhas serão distribuídas uma hora antes.</p>\
         <p>Mais informações podem ser obtidas na sede da Funcultural em horário comercial.</p>",
    );
    let blocks = segment(&html).unwrap();

    use BlockKind::*;
    assert_eq!(
        kinds(&blocks),
        vec![Subtitle, Paragraph, Paragraph, Image, Paragraph, Paragraph, Image]
    );
    assert_eq!(blocks[0].content, "Programação completa do festival de teatro");
    assert_eq!(
        blocks[3].content,
        "https://funcultural.portovelho.ro.gov.br/uploads/capa.jpg"
    );
    assert_eq!(
        blocks[6].content,
        "https://funcultural.portovelho.ro.gov.br/uploads/palco.jpg"
    );
    assert!(blocks.iter().all(|b| !b.content.contains("var x")));
}

#[test]
fn test_image_only_article() {
    let html = page(
        "<div class=\"artigo-img-wrap\"><img src=\"/uploads/cartaz.jpg\"></div>\
         <p>Confira</p>",
    );
    let blocks = segment(&html).unwrap();
    assert_eq!(
        blocks,
        vec![ContentBlock::image(
            "https://funcultural.portovelho.ro.gov.br/uploads/cartaz.jpg"
        )]
    );
}

#[test]
fn test_missing_article_node() {
    let html = "<html><body><div class=\"noticia\"><p>Texto qualquer sem artigo aqui.</p></div></body></html>";
    assert!(segment(html).is_none());
}

#[test]
fn test_nested_content_uses_deep_fallback() {
    let html = page(
        "<section><div class=\"texto\">\
         <p>Primeiro parágrafo com conteúdo suficiente para ser mantido.</p>\
         <p>Segundo parágrafo também com conteúdo suficiente para ser mantido.</p>\
         </div></section>",
    );
    let blocks = segment(&html).unwrap();
    let texts: Vec<_> = blocks.iter().filter_map(ContentBlock::plain_text).collect();
    // The wrapper div holds both paragraphs' text and comes first in document order.
    assert!(texts[0].starts_with("Primeiro parágrafo"));
    assert!(texts.iter().any(|t| t.starts_with("Segundo parágrafo")));
}

#[test]
fn test_repeated_paragraphs_kept_once() {
    let p = "<p>Inscrições abertas para as oficinas de música e dança.</p>";
    let html = page(&format!("{p}{p}<p>Inscrições abertas para as oficinas de MÚSICA e dança!</p>"));
    let blocks = segment(&html).unwrap();
    assert_eq!(blocks.len(), 1);
}

#[test]
fn test_pasted_release_collapses_to_one_block() {
    let long = "O evento celebra a cultura local com shows, oficinas e feiras. ".repeat(12);
    let html = page(&format!(
        "<div class=\"artigo-img-wrap\"><img src=\"/uploads/a.jpg\"></div>\
         <p>Publicado pela assessoria de comunicação da Funcultural hoje.</p>\
         <div>{long}</div>"
    ));
    let blocks = segment(&html).unwrap();
    assert_eq!(kinds(&blocks), vec![BlockKind::Paragraph, BlockKind::Image]);
    assert!(blocks[0].content.starts_with("O evento celebra"));
}

#[test]
fn test_segmentation_is_deterministic() {
    let html = page(
        "<div class=\"artigo-img-wrap\"><img src=\"/uploads/a.jpg\"></div>\
         <p>Primeiro parágrafo com conteúdo suficiente para ser mantido.</p>\
         <p><strong>Serviço: ingressos à venda na bilheteria</strong></p>",
    );
    assert_eq!(segment(&html), segment(&html));
}
