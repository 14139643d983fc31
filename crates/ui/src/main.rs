use confab::app::{ChatAppShell, ClearChat, CopyChat, ExportChat, Quit};
use confab::theme::apply_theme;
use confab_chat::ConfigStore;
use gpui::*;
use gpui_component::Root;
use gpui_component::notification::NotificationList;

/// Application entry point.
///
/// Loads settings, initializes the tokio bridge and gpui-component, applies
/// the configured theme, then opens the chat window inside a `Root`.
fn main() {
    tracing_subscriber::fmt::init();

    let config_store = ConfigStore::load();
    let config = config_store.config();
    tracing::info!(
        path = %config_store.config_path().display(),
        provider_id = %config.provider_id,
        "settings loaded"
    );

    let app = Application::new().with_assets(gpui_component_assets::Assets);

    app.run(move |cx| {
        gpui_tokio_bridge::init(cx);

        // Required before any Root usage.
        gpui_component::init(cx);
        apply_theme(config.theme_mode, None, cx);

        cx.on_action(|_: &Quit, cx| {
            cx.quit();
        });

        cx.bind_keys([
            KeyBinding::new("cmd-q", Quit, None),
            KeyBinding::new("cmd-k", ClearChat, None),
            KeyBinding::new("cmd-shift-c", CopyChat, None),
            KeyBinding::new("cmd-shift-e", ExportChat, None),
        ]);

        cx.spawn(async move |cx| {
            cx.update(|cx| {
                let options = WindowOptions {
                    window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                        None,
                        size(px(960.), px(760.)),
                        cx,
                    ))),
                    titlebar: Some(TitlebarOptions {
                        appears_transparent: true,
                        traffic_light_position: Some(point(px(9.), px(9.))),
                        ..Default::default()
                    }),
                    // Client decorations so the shell draws its own title area.
                    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
                    window_decorations: Some(WindowDecorations::Client),
                    #[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
                    window_decorations: None,
                    ..Default::default()
                };

                let opened = cx.open_window(options, |window, cx| {
                    let notification_list = cx.new(|cx| NotificationList::new(window, cx));
                    let shell = cx.new(|cx| {
                        ChatAppShell::new(config.clone(), notification_list, window, cx)
                    });
                    cx.new(|cx| Root::new(shell, window, cx))
                });

                match opened {
                    Ok(_) => cx.activate(true),
                    Err(error) => {
                        tracing::error!(error = %error, "failed to open main window");
                        cx.quit();
                    }
                }
            })
        })
        .detach();
    });
}
