//! End-to-end test of a sign-in form component
//!
//! The model keeps three text fields, derives validation state from them
//! through computed fields, and records a JSON payload on submit. Markup
//! drives everything else:
//! 1. Input classes follow validation on every keystroke
//! 2. The submit button is disabled until the form is valid
//! 3. Submitting prevents the default action and calls the model

use datawire_binding::events::dispatch;
use datawire_binding::prelude::*;
use proptest::prelude::*;
use rstest::rstest;
use serde_json::json;

const DOCUMENT: &str = r#"
<main>
	<form data-component="signin" data-on-submit="{ $event.preventDefault(); handleSubmit() }">
		<input name="username" data-bind-value="username" data-value-class-name="usernameClass">
		<input name="password" type="password" data-bind-value="password" data-value-class-name="passwordClass">
		<input name="password2" type="password" data-bind-value="password2" data-value-class-name="password2Class">
		<p data-text="'strength: ' + score().toFixed(0)"></p>
		<button type="submit" data-disabled="!canSignup">Sign up</button>
	</form>
</main>
"#;

#[derive(Debug, Default)]
struct SigninForm {
	username: String,
	password: String,
	password2: String,
	submissions: Vec<String>,
}

impl SigninForm {
	fn username_ok(&self) -> bool {
		self.username.chars().count() > 4
	}

	fn passwords_match(&self) -> bool {
		self.password == self.password2
	}

	fn sufficient_password(&self) -> bool {
		self.password.chars().count() > 8 && self.score() > 50.0
	}

	fn can_signup(&self) -> bool {
		self.username_ok() && self.passwords_match() && self.sufficient_password()
	}

	/// Every character scores 5 divided by how often it has appeared so
	/// far; each character class beyond the first adds 10.
	fn score(&self) -> f64 {
		if self.password.is_empty() {
			return 0.0;
		}
		let mut seen = std::collections::HashMap::new();
		let mut score = 0.0;
		for c in self.password.chars() {
			let count = seen.entry(c).or_insert(0u32);
			*count += 1;
			score += 5.0 / f64::from(*count);
		}

		let classes = [
			self.password.chars().any(|c| c.is_ascii_digit()),
			self.password.chars().any(|c| c.is_ascii_lowercase()),
			self.password.chars().any(|c| c.is_ascii_uppercase()),
			self.password.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '_')),
		];
		let variations = classes.iter().filter(|hit| **hit).count() as f64;
		score + (variations - 1.0) * 10.0
	}

	fn input_class(ok: bool) -> Value {
		Value::from(if ok { "input is-success" } else { "input is-danger" })
	}
}

impl Model for SigninForm {
	fn field(&self, name: &str) -> Option<Value> {
		let value = match name {
			"username" => Value::from(self.username.as_str()),
			"password" => Value::from(self.password.as_str()),
			"password2" => Value::from(self.password2.as_str()),
			"usernameOK" => Value::Bool(self.username_ok()),
			"usernameClass" => Self::input_class(self.username_ok()),
			"passwordsMatch" => Value::Bool(self.passwords_match()),
			"password2Class" => Self::input_class(self.passwords_match()),
			"sufficientPassword" => Value::Bool(self.sufficient_password()),
			"passwordClass" => Self::input_class(self.sufficient_password()),
			"canSignup" => Value::Bool(self.can_signup()),
			_ => return None,
		};
		Some(value)
	}

	fn set_field(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
		let slot = match name {
			"username" => &mut self.username,
			"password" => &mut self.password,
			"password2" => &mut self.password2,
			_ => {
				return Err(EvalError::FieldRejected {
					field: name.to_string(),
					reason: "computed field".to_string(),
				});
			}
		};
		*slot = value.to_display_string();
		Ok(())
	}

	fn call(&mut self, name: &str, _args: Vec<Value>) -> Result<Value, EvalError> {
		match name {
			"score" => Ok(Value::Number(self.score())),
			"handleSubmit" => {
				let payload = json!({ "username": self.username, "password": self.password });
				self.submissions.push(payload.to_string());
				Ok(Value::Undefined)
			}
			_ => Err(EvalError::UnknownMethod(name.to_string())),
		}
	}
}

struct Page {
	event_loop: EventLoop,
	app: Application,
	form: Element,
}

impl Page {
	fn load() -> Self {
		let document = Element::from_markup(DOCUMENT).unwrap();
		let event_loop = EventLoop::new();
		let app = ApplicationBuilder::new()
			.register("signin", |_root: &Element| SigninForm::default())
			.bind(&document, &event_loop);
		event_loop.run_until_idle().unwrap();
		let form = document.children()[0].clone();
		Self {
			event_loop,
			app,
			form,
		}
	}

	fn input(&self, name: &str) -> Element {
		self.form.find_by_attribute("name", Some(name))[0].clone()
	}

	fn button(&self) -> Element {
		self.form.find_by_attribute("type", Some("submit"))[0].clone()
	}

	fn strength(&self) -> String {
		self.form.find_by_attribute("data-text", None)[0].text_content()
	}

	fn type_into(&self, name: &str, text: &str) {
		let input = self.input(name);
		input.set_property("value", Value::from(text)).unwrap();
		dispatch(&input, &Event::input()).unwrap();
	}

	fn component(&self) -> Component<SigninForm> {
		self.app.component::<SigninForm>(&self.form).unwrap()
	}
}

#[test]
fn test_initial_render() {
	let page = Page::load();
	assert!(page.event_loop.is_idle());
	assert_eq!(page.component().lifecycle(), Lifecycle::Ready);
	assert!(!page.form.has_attribute("data-component"));

	assert_eq!(page.input("username").get_attribute("class").as_deref(), Some("input is-danger"));
	// Both passwords are empty, so they match.
	assert_eq!(page.input("password2").get_attribute("class").as_deref(), Some("input is-success"));
	assert!(page.button().has_attribute("disabled"));
	assert_eq!(page.strength(), "strength: 0");
}

#[test]
fn test_fill_in_and_submit() {
	let page = Page::load();
	page.type_into("username", "alice");
	assert_eq!(page.input("username").get_attribute("class").as_deref(), Some("input is-success"));
	assert!(page.button().has_attribute("disabled"));

	page.type_into("password", "correct-Horse9");
	assert_eq!(page.input("password").get_attribute("class").as_deref(), Some("input is-success"));
	assert_eq!(page.input("password2").get_attribute("class").as_deref(), Some("input is-danger"));
	assert_eq!(page.strength(), "strength: 87");

	page.type_into("password2", "correct-Horse9");
	assert!(!page.button().has_attribute("disabled"));

	let submit = Event::new("submit");
	dispatch(&page.form, &submit).unwrap();
	assert!(submit.default_prevented());

	let submissions = page.component().with_model(|m| m.submissions.clone()).unwrap();
	assert_eq!(submissions.len(), 1);
	let payload: serde_json::Value = serde_json::from_str(&submissions[0]).unwrap();
	assert_eq!(payload, json!({ "username": "alice", "password": "correct-Horse9" }));
}

#[rstest]
#[case("aaaaaaaaaa", false)]
#[case("abcdefgh", false)]
#[case("abcdefghij", false)]
#[case("Abcdefgh1!", true)]
#[case("correct-Horse9", true)]
fn test_password_strength(#[case] password: &str, #[case] sufficient: bool) {
	let form = SigninForm {
		password: password.to_string(),
		..Default::default()
	};
	assert_eq!(form.sufficient_password(), sufficient, "score {}", form.score());
}

#[test]
fn test_computed_fields_are_read_only() {
	let page = Page::load();
	let err = page
		.component()
		.set_field("canSignup", Value::Bool(true))
		.unwrap_err();
	assert!(matches!(err, BindingError::Eval { .. }));
}

#[test]
fn test_shutdown_detaches_listeners() {
	let mut page = Page::load();
	let component = page.component();
	page.app.shutdown().unwrap();
	assert!(page.app.is_empty());
	assert_eq!(component.lifecycle(), Lifecycle::Disconnected);

	page.type_into("username", "bob");
	assert_eq!(component.field("username").unwrap(), Value::from(""));
	assert_eq!(page.form.listener_count("submit"), 0);
}

proptest! {
	#[test]
	fn prop_button_matches_can_signup(
		username in "[a-z]{0,8}",
		password in "[a-zA-Z0-9!]{0,12}",
		same in any::<bool>(),
	) {
		let page = Page::load();
		page.type_into("username", &username);
		page.type_into("password", &password);
		page.type_into("password2", if same { password.as_str() } else { "nope" });

		let can_signup = page.component().with_model(SigninForm::can_signup).unwrap();
		prop_assert_eq!(!page.button().has_attribute("disabled"), can_signup);
	}
}
