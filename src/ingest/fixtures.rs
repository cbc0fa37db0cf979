/// Test fixtures: trimmed weather repository CSV exports.
///
/// Structurally faithful to the real export (many columns, the ones we use
/// scattered among them) but cut down to a handful of rows.

/// Four rows: Kyiv, Lviv, a quoted location with a comma, and a 72 kph
/// outlier reading that the analysis filter (not the parser) must drop.
#[cfg(test)]
pub(crate) fn fixture_repository_csv() -> &'static str {
    "country,location_name,latitude,longitude,timezone,last_updated_epoch,last_updated,temperature_celsius,temperature_fahrenheit,condition_text,wind_mph,wind_kph,wind_degree,wind_direction,pressure_mb,humidity,feels_like_celsius,feels_like_fahrenheit\n\
Ukraine,Kyiv,50.43,30.52,Europe/Kiev,1715854500,2024-05-16 13:15,22.0,71.6,Partly cloudy,8.1,13.0,180,S,1012.0,40,24.6,76.3\n\
Ukraine,Lviv,49.83,24.0,Europe/Kiev,1715854500,2024-05-16 13:15,18.0,64.4,Sunny,5.6,9.0,270,W,1015.0,55,18.0,64.4\n\
United States of America,\"Washington, D.C.\",38.9,-77.04,America/New_York,1715856300,2024-05-16 06:45,15.6,60.1,Mist,3.8,6.1,10,N,1009.0,93,15.6,60.1\n\
Ukraine,Kyiv,50.43,30.52,Europe/Kiev,1715940900,2024-05-17 13:15,19.0,66.2,Thunder,44.7,72.0,200,SSW,1001.0,80,14.2,57.6\n"
}

#[cfg(test)]
pub(crate) fn fixture_header_only_csv() -> &'static str {
    "last_updated,wind_kph,temperature_celsius,feels_like_celsius,location_name\n"
}

/// Second data row (line 3) has a non-numeric wind speed.
#[cfg(test)]
pub(crate) fn fixture_bad_wind_csv() -> &'static str {
    "last_updated,wind_kph,temperature_celsius,feels_like_celsius,location_name\n\
2024-05-16 13:15,12.2,20.0,19.0,Kyiv\n\
2024-05-16 14:15,calm,20.5,20.5,Kyiv\n"
}
