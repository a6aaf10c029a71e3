use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// Binlog event type codes.
///
/// @see  https://dev.mysql.com/doc/dev/mysql-server/latest/namespacemysql_1_1binlog_1_1event.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum LogEventType {
    UnknownEvent = 0,
    StartEventV3 = 1,
    /// 记录一条query语句，在基于语句的复制和基于行的复制都会有。
    QueryEvent = 2,
    /// MySQL停止时，在文件尾加入STOP_EVENT
    StopEvent = 3,
    /// 二进制日志更换一个新文件
    RotateEvent = 4,
    IntvarEvent = 5,
    LoadEvent = 6,
    SlaveEvent = 7,
    CreateFileEvent = 8,
    AppendBlockEvent = 9,
    ExecLoadEvent = 10,
    DeleteFileEvent = 11,
    NewLoadEvent = 12,
    RandEvent = 13,
    UserVarEvent = 14,
    /// MySQL根据其定义来解析其他事件
    FormatDescriptionEvent = 15,
    /// Commit事件
    XidEvent = 16,
    BeginLoadQueryEvent = 17,
    ExecuteLoadQueryEvent = 18,
    /// ROW EVENT之前产生，为的是对ROW EVENT解析提供依据。
    TableMapEvent = 19,
    PreGaWriteRowsEvent = 20,
    PreGaUpdateRowsEvent = 21,
    PreGaDeleteRowsEvent = 22,
    WriteRowsEvent = 23,
    UpdateRowsEvent = 24,
    DeleteRowsEvent = 25,
    IncidentEvent = 26,
    HeartbeatLogEvent = 27,
    IgnorableLogEvent = 28,
    RowsQueryLogEvent = 29,
    WriteRowsEventV2 = 30,
    UpdateRowsEventV2 = 31,
    DeleteRowsEventV2 = 32,
    GtidLogEvent = 33,
    AnonymousGtidLogEvent = 34,
    PreviousGtidsLogEvent = 35,
    TransactionContextEvent = 36,
    ViewChangeEvent = 37,
    XaPrepareLogEvent = 38,
    PartialUpdateRowsEvent = 39,
    /// 事件体是内嵌事件的压缩流。
    TransactionPayloadEvent = 40,
    HeartbeatLogEventV2 = 41,
    GtidTaggedLogEvent = 42,
}

#[cfg(test)]
mod test {
    use super::LogEventType;

    #[test]
    fn test_wire_codes() {
        assert_eq!(u8::from(LogEventType::QueryEvent), 2);
        assert_eq!(u8::from(LogEventType::XidEvent), 16);
        assert_eq!(u8::from(LogEventType::TableMapEvent), 19);
        assert_eq!(u8::from(LogEventType::WriteRowsEventV2), 30);
        assert_eq!(u8::from(LogEventType::TransactionPayloadEvent), 40);
        assert_eq!(LogEventType::try_from(40u8), Ok(LogEventType::TransactionPayloadEvent));
        assert!(LogEventType::try_from(200u8).is_err());
    }
}
