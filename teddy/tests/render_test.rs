use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use teddy::{EngineConfig, MemorySource, RenderWarning, TeddyEngine};

const INDEX: &str = r#"<!DOCTYPE html>
<html>
  <head><title>{title}</title></head>
  <body>
    <if user.admin>
      <p>Admin</p>
    </if>
    <elseif user.name>
      <p>Hello {user.name}</p>
    </elseif>
    <else>
      <p>Guest</p>
    </else>
    <ul>
      <foreach val="item" in="items"><li>{item}</li></foreach>
    </ul>
  </body>
</html>"#;

fn engine_with(config: EngineConfig, templates: &[(&str, &str)]) -> TeddyEngine {
    let source = MemorySource::new();
    for (name, body) in templates {
        source.insert(*name, *body);
    }
    TeddyEngine::with_source(config, source)
}

fn engine(templates: &[(&str, &str)]) -> TeddyEngine {
    engine_with(EngineConfig::default(), templates)
}

#[test]
fn test_cached_and_uncached_renders_agree() {
    let model = json!({ "title": "Home", "user": { "name": "Ada" }, "items": ["x", "y"] });
    let expected = "<!DOCTYPE html><html><head><title>Home</title></head><body><p>Hello Ada</p><ul><li>x</li><li>y</li></ul></body></html>";

    let cached = engine(&[("index.html", INDEX)]);
    cached.compile("index").expect("Failed to compile index");
    assert_eq!(cached.render("index", &model).unwrap(), expected);
    assert_eq!(cached.render("index", &model).unwrap(), expected);

    let uncached = engine_with(
        EngineConfig {
            compile_at_every_render: true,
            ..EngineConfig::default()
        },
        &[("index.html", INDEX)],
    );
    assert_eq!(uncached.render("index", &model).unwrap(), expected);
    assert_eq!(uncached.render("index", &model).unwrap(), expected);
}

#[test]
fn test_at_most_one_branch_survives() {
    let engine = engine(&[(
        "chain.html",
        "<if a>A</if><elseif b>B</elseif><elseunless c>C</elseunless><else>D</else>",
    )]);

    let cases = [
        (json!({ "a": 1, "b": 1 }), "A"),
        (json!({ "b": 1 }), "B"),
        (json!({ "c": 0 }), "C"),
        (json!({ "c": 1 }), "D"),
    ];
    for (model, expected) in cases {
        let html = engine.render("chain", &model).unwrap();
        assert_eq!(html, expected, "model {}", model);
        for tag in ["<if", "<elseif", "<elseunless", "<else"] {
            assert!(!html.contains(tag));
        }
    }

    let without_else = engine_with(EngineConfig::default(), &[("t.html", "<if a>A</if><elseif b>B</elseif>!")]);
    assert_eq!(without_else.render("t", &json!({})).unwrap(), "!");
}

#[test]
fn test_negation() {
    let engine = engine(&[
        ("not.html", "<if not:logged>out</if><else>in</else>"),
        ("unless.html", "<unless logged>out</unless><else>in</else>"),
    ]);
    for template in ["not", "unless"] {
        assert_eq!(engine.render(template, &json!({ "logged": false })).unwrap(), "out");
        assert_eq!(engine.render(template, &json!({ "logged": true })).unwrap(), "in");
        assert_eq!(engine.render(template, &json!({})).unwrap(), "out");
    }
}

#[test]
fn test_equality_and_combinators() {
    let engine = engine(&[
        ("role.html", r#"<if role="{wanted}">match</if><else>no</else>"#),
        ("either.html", "<if a or b>yes</if><else>no</else>"),
        ("both.html", "<if a and b>yes</if><else>no</else>"),
    ]);

    assert_eq!(
        engine.render("role", &json!({ "role": "admin", "wanted": "admin" })).unwrap(),
        "match"
    );
    assert_eq!(
        engine.render("role", &json!({ "role": "user", "wanted": "admin" })).unwrap(),
        "no"
    );
    assert_eq!(engine.render("either", &json!({ "b": 1 })).unwrap(), "yes");
    assert_eq!(engine.render("both", &json!({ "b": 1 })).unwrap(), "no");
    assert_eq!(engine.render("both", &json!({ "a": 1, "b": 1 })).unwrap(), "yes");
}

#[test]
fn test_one_line_conditionals() {
    let engine = engine(&[(
        "nav.html",
        r#"<a href="/" if-active true="class='on'" false="class=off">Home</a>"#,
    )]);
    assert_eq!(
        engine.render("nav", &json!({ "active": true })).unwrap(),
        r#"<a href="/" class="on">Home</a>"#
    );
    assert_eq!(
        engine.render("nav", &json!({ "active": false })).unwrap(),
        r#"<a href="/" class="off">Home</a>"#
    );
}

#[test]
fn test_foreach() {
    let engine = engine(&[
        ("list.html", r#"<foreach val="x" in="items">{x}</foreach>"#),
        ("keyed.html", r#"<foreach val="x" key="i" in="items">[{i}:{x}]</foreach>"#),
    ]);
    let model = json!({ "items": ["a", "b"] });
    assert_eq!(engine.render("list", &model).unwrap(), "ab");
    assert_eq!(engine.render("keyed", &model).unwrap(), "[0:a][1:b]");
}

#[test]
fn test_dotted_variables() {
    let engine = engine(&[("t.html", "<p>{a.b}</p>")]);
    assert_eq!(engine.render("t", &json!({ "a": { "b": "v" } })).unwrap(), "<p>v</p>");

    let report = engine.render_report("t", &json!({ "a": {} })).unwrap();
    assert_eq!(report.html, "<p>{a.b}</p>");
    assert_eq!(
        report.warnings,
        vec![RenderWarning::UnresolvedVariable {
            name: "a.b".to_string()
        }]
    );
}

#[test]
fn test_model_keys_are_case_insensitive() {
    #[derive(Serialize)]
    struct Page {
        #[serde(rename = "PageTitle")]
        page_title: String,
    }

    let engine = engine(&[("t.html", "<h1>{pagetitle} {PAGETITLE}</h1>")]);
    let page = Page {
        page_title: "Docs".to_string(),
    };
    assert_eq!(engine.render("t", &page).unwrap(), "<h1>Docs Docs</h1>");
}

#[test]
fn test_include_with_args() {
    let engine = engine(&[
        ("greeting.html", "<p>{greeting}</p>"),
        ("page.html", "<include src=\"greeting\"><arg greeting>Hi</arg></include>"),
    ]);
    assert_eq!(engine.render("page", &json!({})).unwrap(), "<p>Hi</p>");
}

#[test]
fn test_missing_include_does_not_fail_the_render() {
    let engine = engine(&[("page.html", r#"<p>a</p><include src="missing"></include>"#)]);
    let report = engine.render_report("page", &json!({})).unwrap();
    assert_eq!(report.html, "<p>a</p>");
    assert!(matches!(
        &report.warnings[0],
        RenderWarning::MissingTemplate { name, .. } if name == "missing.html"
    ));
}

#[test]
fn test_unusable_models_render_as_empty() {
    let engine = engine(&[("t.html", "<p>{a}</p><if a>yes</if>")]);

    let mut keyed_by_tuple = HashMap::new();
    keyed_by_tuple.insert((1u8, 2u8), 3u8);
    assert_eq!(engine.render("t", &keyed_by_tuple).unwrap(), "<p>{a}</p>");

    assert_eq!(engine.render("t", &json!(["a"])).unwrap(), "<p>{a}</p>");

    let mut deep = json!("leaf");
    for _ in 0..300 {
        deep = json!({ "n": deep });
    }
    assert_eq!(engine.render("t", &json!({ "a": deep })).unwrap(), "<p>{a}</p>");
}

/// A model whose `Serialize` impl contains itself
struct Cyclic;

impl Serialize for Cyclic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("a", "never shown")?;
        map.serialize_entry("self", self)?;
        map.end()
    }
}

#[test]
fn test_self_referential_model_renders_as_empty() {
    let engine = engine(&[("t.html", "<p>{a}</p><if a>yes</if>")]);
    assert_eq!(engine.render("t", &Cyclic).unwrap(), "<p>{a}</p>");
    assert_eq!(engine.render_source("<p>ok</p>", &Cyclic).unwrap(), "<p>ok</p>");
}

#[test]
fn test_self_referential_variables_terminate() {
    let engine = engine_with(
        EngineConfig {
            max_passes: 25,
            ..EngineConfig::default()
        },
        &[("t.html", "<p>{a}</p>")],
    );
    let report = engine
        .render_report("t", &json!({ "a": "{b}", "b": "{a}" }))
        .unwrap();
    assert!(report.html == "<p>{a}</p>" || report.html == "<p>{b}</p>");
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, RenderWarning::RunawayExpansion { .. })));
}

#[test]
fn test_self_including_templates_terminate() {
    let engine = engine_with(
        EngineConfig {
            max_passes: 10,
            ..EngineConfig::default()
        },
        &[
            ("a.html", r#"<include src="b"></include>"#),
            ("b.html", r#"<include src="a"></include>"#),
        ],
    );
    let report = engine.render_report("a", &json!({})).unwrap();
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, RenderWarning::RunawayExpansion { .. })));
}

#[test]
fn test_packaged_templates() {
    let engine = engine(&[("quote.html", "<p class='q'>\n  it's\n</p>")]);
    assert!(engine.packaged("quote").is_none());
    engine.compile("quote").unwrap();
    assert_eq!(
        engine.packaged("quote").unwrap(),
        r"teddy.compiledTemplates['quote.html']='<p class=\'q\'> it\'s</p>';"
    );
}
