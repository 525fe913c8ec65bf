mod common;

use std::time::Duration;

use common::{Reply, ScriptedTransport, init_logging, output};
use privsh::error::{ConfigError, DriverError, Error};
use privsh::{Driver, DriverBuilder, GenericDriver};
use tokio_util::sync::CancellationToken;

fn ocnos(transport: &mut ScriptedTransport) -> GenericDriver<&mut ScriptedTransport> {
    init_logging();
    DriverBuilder::new()
        .platform("ipinfusion_ocnos")
        .timeout(Duration::from_secs(1))
        .build(transport)
        .unwrap()
}

#[tokio::test]
async fn escalates_one_hop_at_a_time() {
    let mut transport = ScriptedTransport::new([
        output("\r\nocnos@OcNOS:~$ "),
        output("cmlsh\r\nOcNOS>"),
        output("enable\r\nOcNOS#"),
        output("configure terminal\r\nEnter configuration commands, one per line.\r\nOcNOS(config)#"),
    ]);

    let mut driver = ocnos(&mut transport);
    driver.acquire_privilege("configuration").await.unwrap();
    assert_eq!(driver.current_privilege(), Some("configuration"));
    drop(driver);

    assert_eq!(transport.sent(), "\ncmlsh\nenable\nconfigure terminal\n");
    assert_eq!(transport.replies_left(), 0);
}

#[tokio::test]
async fn deescalates_back_to_the_shell() {
    let mut transport = ScriptedTransport::new([
        output("\r\nOcNOS(config-if)#"),
        output("end\r\nOcNOS#"),
        output("disable\r\nOcNOS>"),
        output("logout\r\n\r\nocnos@OcNOS:~$ "),
    ]);

    let mut driver = ocnos(&mut transport);
    driver.acquire_privilege("linux").await.unwrap();
    assert_eq!(driver.current_privilege(), Some("linux"));
    drop(driver);

    assert_eq!(transport.sent(), "\nend\ndisable\nlogout\n");
}

#[tokio::test]
async fn already_at_target_only_confirms() {
    let mut transport = ScriptedTransport::new([output("\r\nOcNOS#")]);

    let mut driver = ocnos(&mut transport);
    driver.acquire_privilege("privilege_exec").await.unwrap();
    assert_eq!(driver.current_privilege(), Some("privilege_exec"));
    drop(driver);

    assert_eq!(transport.sent(), "\n");
}

#[tokio::test]
async fn unknown_level_fails_before_any_io() {
    let mut transport = ScriptedTransport::new([output("\r\nOcNOS#")]);

    let mut driver = ocnos(&mut transport);
    let err = driver.acquire_privilege("shell").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::UnknownPrivilege { ref name }) if name == "shell"
    ));
    drop(driver);

    assert_eq!(transport.sent(), "");
    assert_eq!(transport.replies_left(), 1);
}

#[tokio::test]
async fn rejected_command_stops_the_path() {
    let mut transport = ScriptedTransport::new([
        output("\r\nOcNOS>"),
        output("enable\r\n% Invalid input detected at '^' marker.\r\nOcNOS>"),
    ]);

    let mut driver = ocnos(&mut transport);
    let err = driver.acquire_privilege("configuration").await.unwrap_err();
    match err {
        Error::Driver(DriverError::CommandRejected {
            command,
            matched,
            output,
        }) => {
            assert_eq!(command, "enable");
            assert_eq!(matched, "% Invalid input detected");
            assert!(output.contains("marker"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(driver.current_privilege(), Some("exec"));
    drop(driver);

    // "configure terminal" was never sent
    assert_eq!(transport.sent(), "\nenable\n");
}

#[tokio::test]
async fn timed_out_hop_keeps_the_last_confirmed_level() {
    let mut transport = ScriptedTransport::new([output("\r\nOcNOS>"), Reply::Timeout]);

    let mut driver = ocnos(&mut transport);
    let err = driver.acquire_privilege("privilege_exec").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Driver(DriverError::TransitionTimeout { ref from, ref to, .. })
            if from == "exec" && to == "privilege_exec"
    ));
    assert_eq!(driver.current_privilege(), Some("exec"));
}

#[tokio::test]
async fn landing_on_another_level_is_reported() {
    let mut transport = ScriptedTransport::new([
        output("\r\nocnos@OcNOS:~$ "),
        output("cmlsh\r\nOcNOS#"),
    ]);

    let mut driver = ocnos(&mut transport);
    let err = driver.acquire_privilege("configuration").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Driver(DriverError::UnexpectedPrivilege { ref expected, ref found })
            if expected == "exec" && found == "privilege_exec"
    ));
    assert_eq!(driver.current_privilege(), Some("privilege_exec"));
}

#[tokio::test]
async fn drift_is_corrected_from_the_prompt() {
    let mut transport = ScriptedTransport::new([
        output("\r\nOcNOS#"),
        // Someone typed "configure terminal" behind the driver's back
        output("\r\nOcNOS(config)#"),
        output("end\r\nOcNOS#"),
    ]);

    let mut driver = ocnos(&mut transport);
    driver.acquire_privilege("privilege_exec").await.unwrap();
    driver.acquire_privilege("privilege_exec").await.unwrap();
    assert_eq!(driver.current_privilege(), Some("privilege_exec"));
    drop(driver);

    assert_eq!(transport.sent(), "\n\nend\n");
}

#[tokio::test]
async fn lost_channel_forgets_the_level() {
    let mut transport = ScriptedTransport::new([
        output("\r\nOcNOS>"),
        output("enable\r\nOcNOS#"),
        Reply::Closed,
    ]);

    let mut driver = ocnos(&mut transport);
    driver.acquire_privilege("privilege_exec").await.unwrap();
    assert_eq!(driver.current_privilege(), Some("privilege_exec"));

    let err = driver.acquire_privilege("exec").await.unwrap_err();
    assert!(err.is_disconnect());
    assert_eq!(driver.current_privilege(), None);
}

#[tokio::test(start_paused = true)]
async fn cancelled_acquisition_leaves_level_unknown() {
    let mut transport = ScriptedTransport::new([
        output("\r\nOcNOS>"),
        Reply::Hang,
        output("\r\nOcNOS#"),
    ]);

    let mut driver = ocnos(&mut transport);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let (result, ()) = tokio::join!(
        driver.acquire_privilege_with_cancel("configuration", &cancel),
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        }
    );

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Driver(DriverError::Cancelled { ref target }) if target == "configuration"));
    assert_eq!(driver.current_privilege(), None);

    // The enable may or may not have taken effect; the next acquisition asks
    driver.acquire_privilege("privilege_exec").await.unwrap();
    assert_eq!(driver.current_privilege(), Some("privilege_exec"));
    drop(driver);

    assert_eq!(transport.sent(), "\nenable\n\n");
}

#[tokio::test]
async fn cancelled_before_start_sends_nothing() {
    let mut transport = ScriptedTransport::new([output("\r\nOcNOS>")]);
    let mut driver = ocnos(&mut transport);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = driver
        .acquire_privilege_with_cancel("privilege_exec", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Driver(DriverError::Cancelled { .. })));
    drop(driver);

    assert_eq!(transport.sent(), "");
}

#[tokio::test(start_paused = true)]
async fn dropped_acquisition_leaves_level_unknown() {
    let mut transport = ScriptedTransport::new([
        output("\r\nOcNOS>"),
        output("enable\r\nOcNOS#"),
        output("\r\nOcNOS#"),
        Reply::Hang,
    ]);

    let mut driver = ocnos(&mut transport);
    driver.acquire_privilege("privilege_exec").await.unwrap();

    let abandoned =
        tokio::time::timeout(Duration::from_secs(5), driver.acquire_privilege("configuration"))
            .await;
    assert!(abandoned.is_err());
    assert_eq!(driver.current_privilege(), None);
}

#[tokio::test(start_paused = true)]
async fn command_prompt_restores_level_after_dropped_acquisition() {
    let mut transport = ScriptedTransport::new([
        output("\r\nOcNOS>"),
        Reply::Hang,
        output("show clock\r\n12:00:00 UTC\r\nOcNOS(config)#"),
    ]);

    let mut driver = ocnos(&mut transport);
    let abandoned =
        tokio::time::timeout(Duration::from_secs(5), driver.acquire_privilege("configuration"))
            .await;
    assert!(abandoned.is_err());
    assert_eq!(driver.current_privilege(), None);

    // The prompt after a plain command is a confirmed level
    let response = driver.send_command("show clock").await.unwrap();
    assert!(response.is_success());
    assert_eq!(driver.current_privilege(), Some("configuration"));
}
