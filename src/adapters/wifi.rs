//! Wi-Fi access-point adapter.
//!
//! The controller publishes its own SoftAP; the operator's phone or panel PC
//! joins it and talks to the external web server.  There is no station mode
//! and no upstream connectivity — the press floor has no infrastructure
//! Wi-Fi.
//!
//! Everything here is `espidf`-only; on host targets Wi-Fi simply does not
//! exist.

#[cfg(target_os = "espidf")]
use anyhow::Context;
#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration, EspWifi},
};
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::config::PressConfig;

/// Bring up the SoftAP and block until it is active.
///
/// Returns the wifi handle; dropping it tears the AP down, so the caller
/// keeps it alive for the process lifetime.
#[cfg(target_os = "espidf")]
pub fn start_access_point(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
    config: &PressConfig,
) -> anyhow::Result<BlockingWifi<EspWifi<'static>>> {
    let mut wifi = BlockingWifi::wrap(
        EspWifi::new(modem, sysloop.clone(), Some(nvs)).context("wifi driver init")?,
        sysloop,
    )
    .context("blocking wifi wrap")?;

    let ap_config = AccessPointConfiguration {
        ssid: config.ap_ssid.as_str().try_into().unwrap_or_default(),
        password: config.ap_password.as_str().try_into().unwrap_or_default(),
        auth_method: AuthMethod::WPA2Personal,
        ..AccessPointConfiguration::default()
    };

    wifi.set_configuration(&Configuration::AccessPoint(ap_config))
        .context("AP configuration")?;
    wifi.start().context("wifi start")?;
    wifi.wait_netif_up().context("AP netif up")?;

    info!("wifi: SoftAP '{}' up", config.ap_ssid);
    Ok(wifi)
}
