use std::time::Duration;

use print_notifier::{
    BodyPart, MailTransport, NotificationDispatcher, Payload, Settings, SmtpMailer,
    SnapshotFetcher, SnapshotSource,
};

#[test]
fn snapshot_fetcher_basic_methods() {
    let url = "http://127.0.0.1:9/snapshot.jpg".to_string();
    let fetcher =
        SnapshotFetcher::new(url.clone(), Duration::from_secs(1)).expect("client builds");
    assert_eq!(fetcher.url(), url);
    // Port 9 is the discard service; nothing answers there.
    assert!(fetcher.fetch().is_err());
}

#[test]
fn smtp_mailer_reports_unreachable_server() {
    let mailer = SmtpMailer::new(
        "127.0.0.1".to_string(),
        9,
        "printer@example.com".to_string(),
        None,
        Duration::from_secs(1),
    );
    let parts = [BodyPart::Text("hello".to_string())];
    assert!(mailer.send("owner@example.com", "Test", &parts).is_err());
}

#[test]
fn dispatch_survives_a_dead_smtp_endpoint() {
    let settings = Settings {
        recipient_address: "owner@example.com".to_string(),
        mail_server: "127.0.0.1".to_string(),
        mail_username: "printer@example.com".to_string(),
        ..Settings::default()
    };
    let mailer = SmtpMailer::new(
        settings.mail_server.clone(),
        9,
        settings.mail_username.clone(),
        None,
        Duration::from_secs(1),
    );
    let dispatcher = NotificationDispatcher::new(settings, Box::new(mailer), None);

    let mut payload = Payload::new();
    payload.insert("name".to_string(), "benchy.gcode".into());

    // The contract: delivery failures are logged, never raised to the caller.
    dispatcher.dispatch("PrintStarted", &payload);
    dispatcher.dispatch_progress(40, Some("benchy.gcode"));
}

#[test]
fn dispatch_ignores_events_without_rules() {
    let settings = Settings {
        recipient_address: "owner@example.com".to_string(),
        mail_server: "127.0.0.1".to_string(),
        mail_username: "printer@example.com".to_string(),
        ..Settings::default()
    };
    let mailer = SmtpMailer::new(
        settings.mail_server.clone(),
        9,
        settings.mail_username.clone(),
        None,
        Duration::from_secs(1),
    );
    let dispatcher = NotificationDispatcher::new(settings, Box::new(mailer), None);

    // No rule for this event, so not even a connection attempt is made.
    dispatcher.dispatch("FilamentChange", &Payload::new());
}
