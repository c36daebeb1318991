//! The web page handed to every client. Values are producer-controlled
//! numeric/placeholder strings, so no escaping is needed.

use core::fmt::Write;

use heapless::String;

use crate::ReadingSet;

pub const PAGE_CAP: usize = 1024;

/// Pure: identical readings render byte-identical output. The meta
/// refresh tag makes the browser re-poll every 60 seconds.
pub fn render(readings: &ReadingSet) -> String<PAGE_CAP> {
    let mut html: String<PAGE_CAP> = String::new();
    let _ = write!(
        &mut html,
        "<!DOCTYPE html>\
         <html><head>\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <link rel=\"icon\" href=\"data:,\">\
         <meta http-equiv=\"refresh\" content=\"60\">\
         <style>\
         body{{text-align:center;font-family:Helvetica,Arial;}}\
         table{{border-collapse:collapse;width:55%;margin-left:auto;margin-right:auto;}}\
         th{{padding:12px;background-color:#87034f;color:white;}}\
         tr{{border:2px solid #000556;padding:12px;}}\
         td{{border:none;padding:14px;}}\
         .sensor{{color:darkblue;font-weight:bold;}}\
         </style></head>\
         <body><h1>Weather Station</h1>\
         <table>\
         <tr><th>Parameter</th><th>Value</th></tr>\
         <tr><td>Temperature</td><td><span class=\"sensor\">{temperature}</span></td></tr>\
         <tr><td>Pressure</td><td><span class=\"sensor\">{pressure}</span></td></tr>\
         <tr><td>Humidity</td><td><span class=\"sensor\">{humidity}</span></td></tr>\
         </table></body></html>",
        temperature = readings.temperature,
        pressure = readings.pressure,
        humidity = readings.humidity,
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UNAVAILABLE;

    fn readings(temperature: &str, pressure: &str, humidity: &str) -> ReadingSet {
        let mut set = ReadingSet::unavailable();
        set.temperature.clear();
        set.temperature.push_str(temperature).unwrap();
        set.pressure.clear();
        set.pressure.push_str(pressure).unwrap();
        set.humidity.clear();
        set.humidity.push_str(humidity).unwrap();
        set
    }

    #[test]
    fn embeds_the_three_values_verbatim() {
        let html = render(&readings("21.4C", "998.1hPa", "35.2%"));
        assert!(html.contains("<span class=\"sensor\">21.4C</span>"));
        assert!(html.contains("<span class=\"sensor\">998.1hPa</span>"));
        assert!(html.contains("<span class=\"sensor\">35.2%</span>"));
    }

    #[test]
    fn placeholder_readings_render_placeholders_in_every_cell() {
        assert_eq!(UNAVAILABLE, "n/a");
        let html = render(&ReadingSet::unavailable());
        let cells = html.match_indices("<span class=\"sensor\">n/a</span>").count();
        assert_eq!(cells, 3);
    }

    #[test]
    fn render_is_idempotent() {
        let set = readings("21.4C", "998.1hPa", "35.2%");
        assert_eq!(render(&set), render(&set));
    }

    #[test]
    fn page_self_refreshes() {
        let html = render(&ReadingSet::unavailable());
        assert!(html.contains("<meta http-equiv=\"refresh\" content=\"60\">"));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
    }
}
