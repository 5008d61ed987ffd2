//! End-to-end rendering against template files on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ferrule::render::{Helper, HelperContext, HelperUnit};
use ferrule::{
    Catalog, ComposerConfig, Events, ListenerError, MapSettings, MemoryTransport,
    ResponseComposer, ResponseError, Route, OUTPUT_EVENT,
};
use minijinja::{Error, Value};
use serde_json::json;
use tempfile::TempDir;

fn template_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, source) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, source).unwrap();
    }
    dir
}

fn composer(dir: &Path, route: Route, transport: &MemoryTransport) -> ResponseComposer {
    let settings = Arc::new(MapSettings::new().with("url.base", "/app").with("site.title", "Ferrule"));
    ResponseComposer::with_settings(transport.clone(), settings)
        .template_dir(dir)
        .request(route)
        .build()
        .unwrap()
}

struct HighlightFunction {
    raw: bool,
}

impl Helper for HighlightFunction {
    fn identity(&self) -> &'static str {
        "app::view::HighlightFunction"
    }

    fn raw_output(&self) -> bool {
        self.raw
    }

    fn call(&self, _ctx: &HelperContext<'_>, args: &[Value]) -> Result<Value, Error> {
        let text = args.first().map(|v| v.to_string()).unwrap_or_default();
        Ok(Value::from(format!("<b>{}</b>", text)))
    }
}

#[test]
fn derives_template_from_mixed_case_route() {
    let dir = template_dir(&[
        ("blogposts/show.html", "post {{ id }}"),
        ("usersettings/editprofile.html", "profile of {{ user }}"),
    ]);

    let cases = [
        (Route::new("BlogPosts", "Show"), json!({"id": 7}), "post 7"),
        (
            Route::new("userSettings", "EDITProfile"),
            json!({"user": "ana"}),
            "profile of ana",
        ),
    ];

    for (route, vars, expected) in cases {
        let transport = MemoryTransport::new();
        let mut response = composer(dir.path(), route, &transport);
        for (key, value) in vars.as_object().unwrap() {
            response.set(key.clone(), value.clone());
        }
        response.output().unwrap();
        assert_eq!(transport.body(), expected);
    }
}

#[test]
fn explicit_template_is_lowercased_and_wins() {
    let dir = template_dir(&[
        ("posts/index.html", "derived"),
        ("errors/notfound.html", "explicit"),
    ]);
    let transport = MemoryTransport::new();
    let mut response = composer(dir.path(), Route::new("posts", "index"), &transport);

    response.set_template("Errors/NotFound").unwrap();
    response.output().unwrap();
    assert_eq!(transport.body(), "explicit");
}

#[test]
fn missing_templates_fail_identically() {
    let dir = template_dir(&[]);

    let transport = MemoryTransport::new();
    let mut explicit = composer(dir.path(), Route::default(), &transport);
    let err = explicit.set_template("missing_template").unwrap_err();
    assert!(matches!(err, ResponseError::TemplateNotFound { ref name } if name == "missing_template"));

    let mut derived = composer(dir.path(), Route::new("Missing", "Template"), &transport);
    let err = derived.output().unwrap_err();
    assert!(matches!(err, ResponseError::TemplateNotFound { ref name } if name == "missing/template"));
}

#[test]
fn buffered_body_precedes_template_output() {
    let dir = template_dir(&[("index/index.html", "[{{ title }}]")]);
    let transport = MemoryTransport::new();
    let mut response = composer(dir.path(), Route::default(), &transport);

    response.set_header("Cache-Control", "no-store").unwrap();
    response.write("<!-- printed -->").unwrap();
    response.set("title", "<Home>");
    response.output().unwrap();

    assert_eq!(transport.headers(), vec!["Cache-Control: no-store"]);
    assert_eq!(transport.body(), "<!-- printed -->[&lt;Home&gt;]");
}

#[test]
fn helper_escaping_contract_in_templates() {
    let dir = template_dir(&[(
        "index/index.html",
        "{{ helpers.highlight('x') }}|{{ helpers.trusted('x') }}|{{ helpers.plain() }}|{{ helpers.nothing('x') }}|",
    )]);
    let transport = MemoryTransport::new();
    let mut response = composer(dir.path(), Route::default(), &transport);

    assert_eq!(response.register(HighlightFunction { raw: false }).unwrap(), "highlight");
    response
        .register_as("trusted", HelperUnit::structured(HighlightFunction { raw: true }))
        .unwrap();
    response
        .register_fn("plain", |_args| Ok(Value::from_safe_string("<i>i</i>".into())))
        .unwrap();
    response.output().unwrap();

    assert_eq!(
        transport.body(),
        "&lt;b&gt;x&lt;&#x2f;b&gt;|<b>x</b>|&lt;i&gt;i&lt;&#x2f;i&gt;||"
    );
}

#[test]
fn builtin_helpers_in_templates() {
    let dir = template_dir(&[
        (
            "posts/show.html",
            "<a href=\"{{ helpers.url('posts', id, {'tab': 'comments'}) }}\">{{ helpers.config('site.title') }}</a>{{ helpers.using('partials/byline', show_byline) }}{{ helpers.using('partials/absent') }}",
        ),
        ("partials/byline.html", "<em>by {{ author }}</em>"),
    ]);

    let transport = MemoryTransport::new();
    let mut response = composer(dir.path(), Route::new("posts", "show"), &transport);
    response.set("id", 12);
    response.set("author", "Kim & Lee");
    response.set("show_byline", true);
    response.output().unwrap();

    assert_eq!(
        transport.body(),
        "<a href=\"&#x2f;app&#x2f;posts&#x2f;12?tab=comments\">Ferrule</a><em>by Kim &amp; Lee</em>"
    );
}

#[test]
fn using_skips_partial_when_condition_is_false() {
    let dir = template_dir(&[
        ("index/index.html", "a{{ helpers.using('partials/box', false) }}b"),
        ("partials/box.html", "BOX"),
    ]);
    let transport = MemoryTransport::new();
    let mut response = composer(dir.path(), Route::default(), &transport);
    response.output().unwrap();
    assert_eq!(transport.body(), "ab");
}

#[test]
fn listeners_adjust_response_before_emission() {
    let dir = template_dir(&[("index/index.html", "{{ stamp }}")]);
    let transport = MemoryTransport::new();

    let events = Events::new().on(OUTPUT_EVENT, |composer| {
        if let Some(headers) = composer.pending_headers_mut() {
            headers.retain(|line| !line.starts_with("X-Debug"));
        }
        if let Some(body) = composer.pending_body_mut() {
            body.push_str("|appended");
        }
        composer.set("stamp", "stamped");
        Ok(())
    });

    let mut response = ResponseComposer::builder(transport.clone())
        .template_dir(dir.path())
        .events(events)
        .build()
        .unwrap();
    response.set_header("X-Debug", "1").unwrap();
    response.set_header("X-Keep", "1").unwrap();
    response.write("body").unwrap();
    response.output().unwrap();

    assert_eq!(transport.headers(), vec!["X-Keep: 1"]);
    assert_eq!(transport.body(), "body|appendedstamped");
}

#[test]
fn listener_error_aborts_emission() {
    let transport = MemoryTransport::new();
    let events = Events::new().on(OUTPUT_EVENT, |_| Err(ListenerError::new("quota exceeded")));

    let mut response = ResponseComposer::builder(transport.clone())
        .events(events)
        .build()
        .unwrap();
    response.write("never sent").unwrap();

    let err = response.output().unwrap_err();
    assert!(matches!(err, ResponseError::Listener(_)));
    assert!(transport.events().is_empty());
    assert!(response.has_emitted());
}

#[test]
fn translated_writes_in_immediate_mode() {
    let transport = MemoryTransport::new();
    let mut response = ResponseComposer::builder(transport.clone())
        .config(ComposerConfig::new().deferred(false))
        .translator(Catalog::new().with("Hello %s", "Hallo %s"))
        .build()
        .unwrap();
    response.suppress_template();

    response.write_translated("Hello %s", &[json!("Welt")]).unwrap();
    assert_eq!(transport.body(), "Hallo Welt");
}

#[test]
fn partials_can_call_helpers() {
    let dir = template_dir(&[
        ("index/index.html", "<nav>{{ helpers.using('partials/nav') }}</nav>"),
        (
            "partials/nav.html",
            "<a href=\"{{ helpers.url('home') }}\">{{ helpers.config('site.title') }}</a>",
        ),
    ]);
    let transport = MemoryTransport::new();
    let mut response = composer(dir.path(), Route::default(), &transport);
    response.output().unwrap();

    assert_eq!(
        transport.body(),
        "<nav><a href=\"&#x2f;app&#x2f;home\">Ferrule</a></nav>"
    );
}

#[test]
fn percent_signs_without_arguments_are_written_verbatim() {
    let transport = MemoryTransport::new();
    let mut response = ResponseComposer::builder(transport.clone())
        .config(ComposerConfig::new().deferred(false))
        .build()
        .unwrap();
    response.suppress_template();

    response.write_translated("100% done", &[]).unwrap();
    response.write_formatted(", 50%d left", &[]).unwrap();
    assert_eq!(transport.body(), "100% done, 50%d left");
}

#[test]
fn default_builder_has_builtin_helpers() {
    let dir = template_dir(&[("index/index.html", "{{ helpers.url('home', {'q': 'a b'}) }}")]);
    let transport = MemoryTransport::new();
    let mut response = ResponseComposer::builder(transport.clone())
        .template_dir(dir.path())
        .build()
        .unwrap();

    assert_eq!(response.helpers().names(), vec!["config", "url", "using"]);
    response.output().unwrap();
    assert_eq!(transport.body(), "&#x2f;home?q=a%20b");
}
